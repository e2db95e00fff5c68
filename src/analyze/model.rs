use chrono::NaiveDate;

/// Headline figures for the filtered window. Every field has a zero default
/// so an empty window still yields a complete set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiSet {
    pub commits: u64,
    pub prs_opened: u64,
    pub prs_merged: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub workflow_runs: u64,
    /// Run-weighted success percentage, 0..100.
    pub workflow_success_rate: f64,
    /// Seconds.
    pub median_pr_merge_time: f64,
    /// Seconds.
    pub median_issue_close_time: f64,
    pub ai_markers: u64,
    pub ai_signal_score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Commits,
    Lines,
    Velocity,
    SizeDistribution,
    AiSignals,
    Workflow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// One point per label; `None` renders as a gap, never as zero.
    pub points: Vec<Option<f64>>,
    pub color: Color,
}

impl Series {
    pub fn new(label: impl ToString, points: Vec<Option<f64>>, color: Color) -> Self {
        Self {
            label: label.to_string(),
            points,
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLUE: Color = Color::new(59, 130, 246);
    pub const GREEN: Color = Color::new(34, 197, 94);
    pub const AMBER: Color = Color::new(245, 158, 11);
    pub const ORANGE: Color = Color::new(249, 115, 22);
    pub const RED: Color = Color::new(239, 68, 68);
    pub const VIOLET: Color = Color::new(139, 92, 246);
    pub const PINK: Color = Color::new(236, 72, 153);
    pub const SKY: Color = Color::new(14, 165, 233);
    pub const EMERALD: Color = Color::new(16, 185, 129);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn rgba(&self, alpha: f64) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, alpha)
    }
}

pub const REPO_PALETTE: [Color; 8] = [
    Color::BLUE,
    Color::GREEN,
    Color::AMBER,
    Color::RED,
    Color::VIOLET,
    Color::PINK,
    Color::SKY,
    Color::EMERALD,
];

/// Series color for a repository, keyed by its index among all known names so
/// the color stays stable while the selection changes.
pub fn repo_color(index: usize) -> Color {
    REPO_PALETTE[index % REPO_PALETTE.len()]
}

pub const SIZE_BUCKETS: [&str; 4] = ["small", "medium", "large", "xlarge"];
pub const SIZE_BUCKET_LABELS: [&str; 4] = ["Small", "Medium", "Large", "X-Large"];
pub const SIZE_BUCKET_COLORS: [Color; 4] =
    [Color::GREEN, Color::AMBER, Color::ORANGE, Color::RED];

/// One detail-table row: the named repository's activity on one retained day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub date: NaiveDate,
    pub commits: u64,
    pub prs_opened: u64,
    pub prs_merged: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}
