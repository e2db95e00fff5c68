use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::{from_str, Value};
use std::fs;

/// The report either loads completely or not at all; every failure on this
/// path surfaces as one user-visible message and no dashboard is produced.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read report `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("report is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed report: {0}")]
    Shape(String),
}

#[derive(Debug, Clone)]
pub struct Report {
    pub metadata: Metadata,
    pub daily: Vec<DayRecord>,
    pub aggregates: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub owner: String,
    pub window: Option<ReportWindow>,
    pub collection_notes: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub repos: Vec<RepoRecord>,
}

#[derive(Debug, Clone)]
pub struct RepoRecord {
    pub name: String,
    pub commits: Option<CommitMetrics>,
    pub prs: Option<PullRequestMetrics>,
    pub issues: Option<IssueMetrics>,
    pub workflows: Option<WorkflowMetrics>,
    pub ai_signals: Option<AiSignalMetrics>,
    pub work_patterns: Option<WorkPatternMetrics>,
}

#[derive(Debug, Clone, Default)]
pub struct CommitMetrics {
    pub count: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PullRequestMetrics {
    pub opened_count: u64,
    pub merged_count: u64,
    pub time_to_merge_seconds_median: Option<f64>,
    pub size_distribution: IndexMap<String, u64>,
}

#[derive(Debug, Clone, Default)]
pub struct IssueMetrics {
    pub time_to_close_seconds_median: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowMetrics {
    pub runs_count: u64,
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct AiSignalMetrics {
    pub commit_markers: u64,
    pub pr_markers: u64,
    pub bot_actor_events: u64,
}

#[derive(Debug, Clone, Default)]
pub struct WorkPatternMetrics {
    pub active_hours: Vec<u32>,
}

// Load
impl Report {
    pub fn load(path: &str) -> Result<Self, LoadError> {
        let json_str = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&json_str)
    }
}

// Parser
impl Report {
    pub fn parse(json_str: &str) -> Result<Self, LoadError> {
        let root: Value = from_str(json_str)?;
        let metadata = Metadata::parse(&root["metadata"])?;
        let mut daily = Vec::new();
        if let Some(days) = root["daily"].as_array() {
            for day in days {
                daily.push(DayRecord::parse(day)?);
            }
        }
        Ok(Self {
            metadata,
            daily,
            aggregates: root["aggregates"].clone(),
        })
    }
}

impl Metadata {
    fn parse(value: &Value) -> Result<Self, LoadError> {
        let window = if value["window"].is_object() {
            Some(ReportWindow::parse(&value["window"])?)
        } else {
            None
        };
        Ok(Self {
            owner: value["owner"].as_str().unwrap_or("").to_string(),
            window,
            collection_notes: value["collection_notes"].as_str().map(String::from),
        })
    }
}

impl ReportWindow {
    fn parse(value: &Value) -> Result<Self, LoadError> {
        Ok(Self {
            start_date: parse_date(&value["start_date"])?,
            end_date: parse_date(&value["end_date"])?,
        })
    }
}

impl DayRecord {
    fn parse(value: &Value) -> Result<Self, LoadError> {
        let date = parse_date(&value["date"])?;
        let mut repos = Vec::new();
        if let Some(entries) = value["repos"].as_array() {
            for entry in entries {
                repos.push(RepoRecord::parse(entry)?);
            }
        }
        Ok(Self { date, repos })
    }
}

impl RepoRecord {
    fn parse(value: &Value) -> Result<Self, LoadError> {
        let Some(name) = value["name"].as_str() else {
            return Err(LoadError::Shape(
                "repo record without a 'name' field".to_string(),
            ));
        };
        Ok(Self {
            name: name.to_string(),
            commits: optional_group(&value["commits"], CommitMetrics::parse),
            prs: optional_group(&value["prs"], PullRequestMetrics::parse),
            issues: optional_group(&value["issues"], IssueMetrics::parse),
            workflows: optional_group(&value["workflows"], WorkflowMetrics::parse),
            ai_signals: optional_group(&value["ai_signals"], AiSignalMetrics::parse),
            work_patterns: optional_group(&value["work_patterns"], WorkPatternMetrics::parse),
        })
    }
}

impl CommitMetrics {
    fn parse(value: &Value) -> Self {
        Self {
            count: value["count"].as_u64().unwrap_or(0),
            lines_added: value["lines_added"].as_u64().unwrap_or(0),
            lines_deleted: value["lines_deleted"].as_u64().unwrap_or(0),
        }
    }
}

impl PullRequestMetrics {
    fn parse(value: &Value) -> Self {
        let mut size_distribution = IndexMap::new();
        if let Some(buckets) = value["size_distribution"].as_object() {
            for (bucket, count) in buckets {
                size_distribution.insert(bucket.clone(), count.as_u64().unwrap_or(0));
            }
        }
        Self {
            opened_count: value["opened_count"].as_u64().unwrap_or(0),
            merged_count: value["merged_count"].as_u64().unwrap_or(0),
            time_to_merge_seconds_median: value["time_to_merge_seconds_median"].as_f64(),
            size_distribution,
        }
    }
}

impl IssueMetrics {
    fn parse(value: &Value) -> Self {
        Self {
            time_to_close_seconds_median: value["time_to_close_seconds_median"].as_f64(),
        }
    }
}

impl WorkflowMetrics {
    fn parse(value: &Value) -> Self {
        Self {
            runs_count: value["runs_count"].as_u64().unwrap_or(0),
            success_rate: value["success_rate"].as_f64(),
        }
    }
}

impl AiSignalMetrics {
    fn parse(value: &Value) -> Self {
        Self {
            commit_markers: value["commit_markers"].as_u64().unwrap_or(0),
            pr_markers: value["pr_markers"].as_u64().unwrap_or(0),
            bot_actor_events: value["bot_actor_events"].as_u64().unwrap_or(0),
        }
    }
}

impl WorkPatternMetrics {
    fn parse(value: &Value) -> Self {
        let active_hours = match value["active_hours"].as_array() {
            Some(hours) => hours
                .iter()
                .filter_map(|hour| hour.as_u64())
                .filter(|hour| *hour < 24)
                .map(|hour| hour as u32)
                .collect(),
            None => Vec::new(),
        };
        Self { active_hours }
    }
}

fn optional_group<T>(value: &Value, parse: fn(&Value) -> T) -> Option<T> {
    value.is_object().then(|| parse(value))
}

fn parse_date(value: &Value) -> Result<NaiveDate, LoadError> {
    let Some(date) = value.as_str() else {
        return Err(LoadError::Shape("missing calendar date".to_string()));
    };
    let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
        return Err(LoadError::Shape(format!("not a calendar date: {date}")));
    };
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_day_record() {
        let report = Report::parse(
            r#"{
                "metadata": {
                    "owner": "octocat",
                    "window": {"start_date": "2025-06-01", "end_date": "2025-06-30"},
                    "collection_notes": "collected nightly"
                },
                "daily": [{
                    "date": "2025-06-01",
                    "repos": [{
                        "name": "api",
                        "commits": {"count": 4, "lines_added": 120, "lines_deleted": 30},
                        "prs": {
                            "opened_count": 2,
                            "merged_count": 1,
                            "time_to_merge_seconds_median": 7200,
                            "size_distribution": {"small": 2, "medium": 1}
                        },
                        "issues": {"time_to_close_seconds_median": 3600},
                        "workflows": {"runs_count": 10, "success_rate": 0.9},
                        "ai_signals": {"commit_markers": 1, "pr_markers": 2, "bot_actor_events": 3},
                        "work_patterns": {"active_hours": [9, 10, 10, 23]}
                    }]
                }],
                "aggregates": {"anything": true}
            }"#,
        )
        .unwrap();

        assert_eq!(report.metadata.owner, "octocat");
        let window = report.metadata.window.unwrap();
        assert_eq!(window.start_date.to_string(), "2025-06-01");
        assert_eq!(report.daily.len(), 1);
        let repo = &report.daily[0].repos[0];
        assert_eq!(repo.name, "api");
        assert_eq!(repo.commits.as_ref().unwrap().count, 4);
        assert_eq!(repo.prs.as_ref().unwrap().size_distribution["small"], 2);
        assert_eq!(repo.workflows.as_ref().unwrap().success_rate, Some(0.9));
        assert_eq!(
            repo.work_patterns.as_ref().unwrap().active_hours,
            vec![9, 10, 10, 23]
        );
        assert!(report.aggregates.is_object());
    }

    #[test]
    fn missing_optional_fields_default_to_empty() {
        let report = Report::parse(
            r#"{"daily": [{"date": "2025-06-02", "repos": [{"name": "web"}]}]}"#,
        )
        .unwrap();

        assert_eq!(report.metadata.owner, "");
        assert!(report.metadata.window.is_none());
        let repo = &report.daily[0].repos[0];
        assert!(repo.commits.is_none());
        assert!(repo.prs.is_none());
        assert!(repo.workflows.is_none());
    }

    #[test]
    fn metric_fields_inside_a_group_default_to_zero() {
        let report = Report::parse(
            r#"{"daily": [{"date": "2025-06-02", "repos": [
                {"name": "web", "commits": {}, "workflows": {"runs_count": 3}}
            ]}]}"#,
        )
        .unwrap();

        let repo = &report.daily[0].repos[0];
        assert_eq!(repo.commits.as_ref().unwrap().count, 0);
        let workflows = repo.workflows.as_ref().unwrap();
        assert_eq!(workflows.runs_count, 3);
        assert_eq!(workflows.success_rate, None);
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(Report::parse("{not json"), Err(LoadError::Json(_))));
    }

    #[test]
    fn rejects_a_day_without_a_date() {
        let result = Report::parse(r#"{"daily": [{"repos": []}]}"#);
        assert!(matches!(result, Err(LoadError::Shape(_))));
    }

    #[test]
    fn load_reports_missing_files() {
        let result = Report::load("no-such-report.json");
        assert!(matches!(result, Err(LoadError::Read { .. })));
    }

    #[test]
    fn out_of_range_hours_are_dropped() {
        let report = Report::parse(
            r#"{"daily": [{"date": "2025-06-02", "repos": [
                {"name": "web", "work_patterns": {"active_hours": [8, 24, 99]}}
            ]}]}"#,
        )
        .unwrap();

        let repo = &report.daily[0].repos[0];
        assert_eq!(repo.work_patterns.as_ref().unwrap().active_hours, vec![8]);
    }
}
