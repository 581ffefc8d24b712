use std::fs;
use std::path::{Path, PathBuf};

use flow_panel::PanelConfig;
use flow_panel::models::PeriodRange;
use tempfile::TempDir;

/// Column holding the location display name in fixture sources
pub const NAME_COLUMN: usize = 21;

/// One source row in the default positional layout
///
/// Entity id at column 0, activity code at 11, location at 20 and its name
/// at 21; every other column is filler.
#[must_use]
pub fn source_line(entity: &str, code: &str, location: &str, name: &str) -> String {
    let mut fields = vec!["x"; NAME_COLUMN + 1];
    fields[0] = entity;
    fields[11] = code;
    fields[20] = location;
    fields[NAME_COLUMN] = name;
    fields.join(";")
}

/// One inclusion row in the default layout: id, flag at 4, start at 5, end at 6
#[must_use]
pub fn inclusion_line(entity: &str, flag: &str, start: &str, end: &str) -> String {
    format!("{entity};x;20070701;00000000;{flag};{start};{end}")
}

/// Write lines to a file, Latin-1 encoded
pub fn write_latin1(path: &Path, lines: &[String]) {
    let bytes: Vec<u8> = lines
        .iter()
        .flat_map(|line| line.chars().chain(std::iter::once('\n')))
        .map(|c| u8::try_from(u32::from(c)).expect("fixture text must be Latin-1"))
        .collect();
    fs::write(path, bytes).unwrap();
}

/// On-disk fixture for a complete run
pub struct Fixture {
    pub dir: TempDir,
    pub config: PanelConfig,
}

impl Fixture {
    /// Sources and inclusion set written to a fresh temporary directory
    #[must_use]
    pub fn new(sources: &[Vec<String>], inclusion: &[String], periods: PeriodRange) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let inclusion_path = dir.path().join("simples.csv");
        write_latin1(&inclusion_path, inclusion);

        let paths: Vec<PathBuf> = sources
            .iter()
            .enumerate()
            .map(|(i, lines)| {
                let path = dir.path().join(format!("estab_part{i}.csv"));
                write_latin1(&path, lines);
                path
            })
            .collect();

        let mut config = PanelConfig {
            periods,
            chunk_size: 3,
            output_path: dir.path().join("out").join("panel.parquet"),
            threads: Some(2),
            ..Default::default()
        };
        config.sources.paths = paths;
        config.sources.name_column = Some(NAME_COLUMN);
        config.inclusion.path = inclusion_path;

        Self { dir, config }
    }

    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
