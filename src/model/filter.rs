use crate::model::Report;
use chrono::NaiveDate;
use indexmap::IndexSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone)]
pub struct FilterState {
    pub repos: IndexSet<String>,
    pub date_range: DateRange,
}

// Create
impl FilterState {
    /// Default state: every known repository selected, date range spanning the
    /// report's full window.
    pub fn select_all(report: &Report, repo_names: &[String]) -> Self {
        Self {
            repos: repo_names.iter().cloned().collect(),
            date_range: full_window(report),
        }
    }
}

// Mutations
impl FilterState {
    pub fn set_repo(&mut self, name: &str, selected: bool) {
        if selected {
            self.repos.insert(name.to_string());
        } else {
            self.repos.shift_remove(name);
        }
    }

    /// The most recent `days` calendar dates of the report, ending at its last
    /// date. Clamped to the first date when the report is shorter than `days`.
    pub fn quick_range(&mut self, report: &Report, days: u32) {
        let dates = sorted_dates(report);
        let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
            return;
        };
        if days == 0 {
            return;
        }
        let start = dates
            .get(dates.len().saturating_sub(days as usize))
            .unwrap_or(first);
        self.date_range = DateRange {
            start: *start,
            end: *last,
        };
    }
}

fn full_window(report: &Report) -> DateRange {
    if let Some(window) = &report.metadata.window {
        return DateRange {
            start: window.start_date,
            end: window.end_date,
        };
    }
    let dates = sorted_dates(report);
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => DateRange {
            start: *first,
            end: *last,
        },
        _ => DateRange {
            start: NaiveDate::default(),
            end: NaiveDate::default(),
        },
    }
}

fn sorted_dates(report: &Report) -> Vec<NaiveDate> {
    let mut dates = report
        .daily
        .iter()
        .map(|day| day.date)
        .collect::<Vec<_>>();
    dates.sort();
    dates
}
