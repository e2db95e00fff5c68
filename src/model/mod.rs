mod filter;
mod report;
mod result;

pub use filter::{DateRange, FilterState};
pub use report::{
    AiSignalMetrics, CommitMetrics, DayRecord, IssueMetrics, LoadError, Metadata,
    PullRequestMetrics, RepoRecord, Report, ReportWindow, WorkPatternMetrics, WorkflowMetrics,
};
pub use result::Result;
