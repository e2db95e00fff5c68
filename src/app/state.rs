use crate::analyze::{Aggregator, ChartKind, DetailRow, KpiSet};
use crate::app::{Debouncer, Event};
use crate::chart::{ChartHandle, ChartOptions, ChartType, SvgSurface};
use crate::model::{DateRange, FilterState, Report, Result};
use indexmap::IndexMap;
use std::fs;
use std::path::PathBuf;
use tokio::time::Duration;
use tracing::{debug, info};

const DEBOUNCE_DELAY: Duration = Duration::from_millis(150);
const DEFAULT_CHART_WIDTH: u32 = 800;
const DEFAULT_CHART_HEIGHT: u32 = 400;
const TOP_HOURS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartId {
    Commits,
    Lines,
    PrVelocity,
    PrSize,
    AiSignals,
    Workflow,
}

impl ChartId {
    pub const ALL: [ChartId; 6] = [
        ChartId::Commits,
        ChartId::Lines,
        ChartId::PrVelocity,
        ChartId::PrSize,
        ChartId::AiSignals,
        ChartId::Workflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartId::Commits => "commits",
            ChartId::Lines => "lines",
            ChartId::PrVelocity => "pr-velocity",
            ChartId::PrSize => "pr-size",
            ChartId::AiSignals => "ai-signals",
            ChartId::Workflow => "workflow",
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartId::Commits => ChartKind::Commits,
            ChartId::Lines => ChartKind::Lines,
            ChartId::PrVelocity => ChartKind::Velocity,
            ChartId::PrSize => ChartKind::SizeDistribution,
            ChartId::AiSignals => ChartKind::AiSignals,
            ChartId::Workflow => ChartKind::Workflow,
        }
    }

    pub fn export_file_name(&self) -> String {
        format!("{}-chart.svg", self.as_str())
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartId::Commits => "Commits by Repository",
            ChartId::Lines => "Lines Changed",
            ChartId::PrVelocity => "PR Merge Velocity",
            ChartId::PrSize => "PR Size Distribution",
            ChartId::AiSignals => "AI Signals",
            ChartId::Workflow => "Workflow Success",
        }
    }

    fn chart_type(&self) -> ChartType {
        match self {
            ChartId::Commits | ChartId::Lines => ChartType::Bar,
            ChartId::PrVelocity | ChartId::AiSignals | ChartId::Workflow => ChartType::Line,
            ChartId::PrSize => ChartType::Doughnut,
        }
    }

    fn options(&self) -> ChartOptions {
        match self {
            ChartId::Commits => ChartOptions {
                x_label: Some("Date".to_string()),
                y_label: Some("Commits".to_string()),
                legend: true,
                begin_at_zero: true,
                y_max: None,
            },
            ChartId::Lines => ChartOptions {
                x_label: Some("Date".to_string()),
                y_label: Some("Lines Changed".to_string()),
                legend: true,
                ..ChartOptions::default()
            },
            ChartId::PrVelocity => ChartOptions {
                x_label: Some("Date".to_string()),
                y_label: Some("Hours".to_string()),
                begin_at_zero: true,
                ..ChartOptions::default()
            },
            ChartId::PrSize => ChartOptions {
                legend: true,
                ..ChartOptions::default()
            },
            ChartId::AiSignals => ChartOptions {
                x_label: Some("Date".to_string()),
                y_label: Some("AI Signals".to_string()),
                legend: true,
                begin_at_zero: true,
                y_max: None,
            },
            ChartId::Workflow => ChartOptions {
                x_label: Some("Date".to_string()),
                y_label: Some("Success Rate (%)".to_string()),
                begin_at_zero: true,
                y_max: Some(100.0),
                ..ChartOptions::default()
            },
        }
    }
}

/// The one place dashboard state lives: the immutable report, the mutable
/// filter selection, and the derived snapshot every artifact reads from.
pub struct DashboardApp {
    report: Report,
    repo_names: Vec<String>,
    filters: FilterState,
    filtered: Report,
    kpis: KpiSet,
    charts: IndexMap<ChartId, ChartHandle>,
    detail_repo: Option<String>,
    banner_visible: bool,
    export_dir: PathBuf,
    debouncer: Debouncer,
    pending_resize: Option<(u32, u32)>,
    recomputes: u64,
}

// Create
impl DashboardApp {
    pub fn new(report: Report) -> Self {
        let repo_names = report.derive_repo_names();
        let filters = FilterState::select_all(&report, &repo_names);
        let filtered = report.apply_filters(&filters);
        let kpis = filtered.compute_kpis();

        let mut charts = IndexMap::new();
        for id in ChartId::ALL {
            let data = filtered.chart_data(id.kind(), &repo_names, &filters.repos);
            let surface = SvgSurface::new(DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT);
            charts.insert(
                id,
                ChartHandle::create(Box::new(surface), id.chart_type(), data, id.options()),
            );
        }

        Self {
            detail_repo: repo_names.first().cloned(),
            banner_visible: report.metadata.collection_notes.is_some(),
            repo_names,
            filters,
            filtered,
            kpis,
            charts,
            report,
            export_dir: PathBuf::from("."),
            debouncer: Debouncer::new(DEBOUNCE_DELAY),
            pending_resize: None,
            recomputes: 0,
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }
}

// Event dispatch
impl DashboardApp {
    pub fn dispatch(&mut self, event: Event) -> Result<()> {
        match event {
            Event::RepoToggled { name, selected } => {
                self.filters.set_repo(&name, selected);
                self.debouncer.trigger();
            }
            Event::AllReposToggled => {
                self.toggle_all_repos();
                self.debouncer.trigger();
            }
            Event::QuickRangeSelected { days } => {
                self.filters.quick_range(&self.report, days);
                self.debouncer.trigger();
            }
            Event::RangeChanged { start, end } => {
                self.filters.date_range = DateRange { start, end };
                self.debouncer.trigger();
            }
            Event::DetailRepoSelected { name } => {
                if self.repo_names.contains(&name) {
                    self.detail_repo = Some(name);
                }
            }
            Event::ExportRequested { chart } => {
                self.export_chart(chart)?;
            }
            Event::BannerDismissed => {
                self.banner_visible = false;
            }
            Event::SurfaceResized { width, height } => {
                self.pending_resize = Some((width, height));
                self.debouncer.trigger();
            }
        }
        Ok(())
    }

    /// Await the debounce window; a burst of filter events lands as a single
    /// recomputation reflecting only the final state.
    pub async fn settle(&mut self) {
        if self.debouncer.expired().await {
            self.recompute();
        }
    }

    pub fn export_chart(&self, id: ChartId) -> Result<PathBuf> {
        let Some(chart) = self.charts.get(&id) else {
            return Err(format!("no chart registered for `{}`", id.as_str()).into());
        };
        fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join(id.export_file_name());
        fs::write(&path, chart.export_image())?;
        info!("Exported chart to {}", path.display());
        Ok(path)
    }

    fn toggle_all_repos(&mut self) {
        if self.filters.repos.len() == self.repo_names.len() {
            self.filters.repos.clear();
        } else {
            self.filters.repos = self.repo_names.iter().cloned().collect();
        }
    }

    fn recompute(&mut self) {
        self.filtered = self.report.apply_filters(&self.filters);
        self.kpis = self.filtered.compute_kpis();
        let resize = self.pending_resize.take();

        let filtered = &self.filtered;
        let repo_names = &self.repo_names;
        let selected = &self.filters.repos;
        for (id, chart) in self.charts.iter_mut() {
            chart.set_data(filtered.chart_data(id.kind(), repo_names, selected));
            match resize {
                Some((width, height)) => chart.resize(width, height),
                None => chart.redraw(),
            }
        }

        self.recomputes += 1;
        debug!("Recomputed dashboard state ({} repos selected)", selected.len());
    }
}

// Read side
impl DashboardApp {
    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn filtered(&self) -> &Report {
        &self.filtered
    }

    pub fn repo_names(&self) -> &[String] {
        &self.repo_names
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn kpis(&self) -> &KpiSet {
        &self.kpis
    }

    pub fn detail_repo(&self) -> Option<&str> {
        self.detail_repo.as_deref()
    }

    pub fn banner_visible(&self) -> bool {
        self.banner_visible
    }

    pub fn chart(&self, id: ChartId) -> Option<&ChartHandle> {
        self.charts.get(&id)
    }

    pub fn detail_rows(&self) -> Vec<DetailRow> {
        match &self.detail_repo {
            Some(name) => self.filtered.detail_rows(name),
            None => Vec::new(),
        }
    }

    pub fn top_active_hours(&self) -> Vec<u32> {
        match &self.detail_repo {
            Some(name) => self.filtered.top_active_hours(name, TOP_HOURS),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture() -> Report {
        Report::parse(
            r#"{
                "metadata": {"owner": "octocat", "collection_notes": "nightly"},
                "daily": [
                    {"date": "2025-06-01", "repos": [
                        {"name": "api", "commits": {"count": 3, "lines_added": 10, "lines_deleted": 2}},
                        {"name": "web", "commits": {"count": 1}}
                    ]},
                    {"date": "2025-06-02", "repos": [
                        {"name": "api", "commits": {"count": 2}}
                    ]}
                ]
            }"#,
        )
        .unwrap()
    }

    fn app() -> DashboardApp {
        DashboardApp::new(fixture()).with_debounce(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn rapid_events_coalesce_into_one_recompute() {
        let mut app = app();
        app.dispatch(Event::RepoToggled {
            name: "api".to_string(),
            selected: false,
        })
        .unwrap();
        app.dispatch(Event::RepoToggled {
            name: "api".to_string(),
            selected: true,
        })
        .unwrap();
        app.dispatch(Event::RepoToggled {
            name: "web".to_string(),
            selected: false,
        })
        .unwrap();

        app.settle().await;
        assert_eq!(app.recomputes, 1);
        // Only the final state is reflected.
        assert_eq!(app.kpis().commits, 5);

        app.settle().await;
        assert_eq!(app.recomputes, 1);
    }

    #[tokio::test]
    async fn toggle_all_flips_between_none_and_all() {
        let mut app = app();
        app.dispatch(Event::AllReposToggled).unwrap();
        app.settle().await;
        assert!(app.filters().repos.is_empty());
        assert_eq!(app.kpis(), &KpiSet::default());

        app.dispatch(Event::AllReposToggled).unwrap();
        app.settle().await;
        assert_eq!(app.filters().repos.len(), 2);
        assert_eq!(app.kpis().commits, 6);
    }

    #[tokio::test]
    async fn quick_range_narrows_the_window() {
        let mut app = app();
        app.dispatch(Event::QuickRangeSelected { days: 1 }).unwrap();
        app.settle().await;

        assert_eq!(app.filters().date_range.start.to_string(), "2025-06-02");
        assert_eq!(app.filtered().daily.len(), 1);
        assert_eq!(app.kpis().commits, 2);
    }

    #[tokio::test]
    async fn detail_selection_ignores_unknown_repos() {
        let mut app = app();
        assert_eq!(app.detail_repo(), Some("api"));

        app.dispatch(Event::DetailRepoSelected {
            name: "nope".to_string(),
        })
        .unwrap();
        assert_eq!(app.detail_repo(), Some("api"));

        app.dispatch(Event::DetailRepoSelected {
            name: "web".to_string(),
        })
        .unwrap();
        assert_eq!(app.detail_repo(), Some("web"));
        assert_eq!(app.detail_rows().len(), 1);
    }

    #[tokio::test]
    async fn export_writes_the_named_svg() {
        let dir = tempdir().unwrap();
        let mut app = DashboardApp::new(fixture())
            .with_debounce(Duration::from_millis(10))
            .with_export_dir(dir.path());

        app.dispatch(Event::ExportRequested {
            chart: ChartId::Commits,
        })
        .unwrap();

        let path = dir.path().join("commits-chart.svg");
        let contents = fs::read(&path).unwrap();
        assert!(contents.starts_with(b"<svg"));
    }

    #[tokio::test]
    async fn resize_refits_every_chart() {
        let mut app = app();
        app.dispatch(Event::SurfaceResized {
            width: 500,
            height: 250,
        })
        .unwrap();
        app.settle().await;

        let svg = String::from_utf8(app.chart(ChartId::Commits).unwrap().export_image()).unwrap();
        assert!(svg.contains(r#"width="500""#));
    }

    #[tokio::test]
    async fn banner_dismissal_sticks() {
        let mut app = app();
        assert!(app.banner_visible());
        app.dispatch(Event::BannerDismissed).unwrap();
        assert!(!app.banner_visible());
    }
}
