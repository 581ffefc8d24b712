//! Economic sector categories of the panel
//!
//! The set is closed: four semantic sectors assigned by the classifier plus
//! the derived `Total`, which only the totalizer produces.

use std::fmt;
use std::str::FromStr;

use crate::error::PanelError;

/// Sector category of a flow cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Agriculture, livestock, forestry and fishing
    Agro,
    /// Extraction and manufacturing
    Industry,
    /// Services and every unmapped activity
    Services,
    /// Public administration
    PublicSector,
    /// Sum over the four semantic categories
    Total,
}

impl Category {
    /// Categories a raw record can be classified into
    pub const SEMANTIC: [Self; 4] = [Self::Agro, Self::Industry, Self::Services, Self::PublicSector];

    /// Categories present in a balanced panel, in output order
    pub const PANEL: [Self; 5] = [
        Self::Agro,
        Self::Industry,
        Self::Services,
        Self::PublicSector,
        Self::Total,
    ];

    /// Label written to output artifacts
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Agro => "Agro",
            Self::Industry => "Industry",
            Self::Services => "Services",
            Self::PublicSector => "Public Sector",
            Self::Total => "Total",
        }
    }

    #[must_use]
    pub const fn is_total(self) -> bool {
        matches!(self, Self::Total)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::PANEL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PanelError::schema(format!("Unknown category label '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for category in Category::PANEL {
            assert_eq!(category.label().parse::<Category>().unwrap(), category);
        }
        assert_eq!("public sector".parse::<Category>().unwrap(), Category::PublicSector);
        assert!("Outros".parse::<Category>().is_err());
    }

    #[test]
    fn test_only_total_is_derived() {
        assert!(Category::SEMANTIC.iter().all(|c| !c.is_total()));
        assert_eq!(Category::PANEL.iter().filter(|c| c.is_total()).count(), 1);
    }
}
