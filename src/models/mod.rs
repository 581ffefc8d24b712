//! Domain types of the flow panel

pub mod category;
pub mod flow;
pub mod panel;
pub mod period;
pub mod record;

pub use category::Category;
pub use flow::{FlowAggregate, FlowCounts, FlowKey, LocationNames};
pub use panel::{BalancedPanel, BalancedPanelRow};
pub use period::{Period, PeriodRange};
pub use record::{InclusionEntry, RawRecord};
