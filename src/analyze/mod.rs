mod analyzer;
mod model;

pub use analyzer::{median, Aggregator};
pub use model::{
    repo_color, ChartData, ChartKind, Color, DetailRow, KpiSet, Series, REPO_PALETTE,
    SIZE_BUCKETS, SIZE_BUCKET_COLORS, SIZE_BUCKET_LABELS,
};
