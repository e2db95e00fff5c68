use crate::app::ChartId;
use chrono::NaiveDate;

/// Logical dashboard interactions, decoupled from any UI binding. Each
/// variant maps to exactly one handler in `DashboardApp::dispatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RepoToggled { name: String, selected: bool },
    AllReposToggled,
    QuickRangeSelected { days: u32 },
    RangeChanged { start: NaiveDate, end: NaiveDate },
    DetailRepoSelected { name: String },
    ExportRequested { chart: ChartId },
    BannerDismissed,
    SurfaceResized { width: u32, height: u32 },
}
