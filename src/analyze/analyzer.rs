use crate::analyze::{
    repo_color, ChartData, ChartKind, Color, DetailRow, KpiSet, Series, SIZE_BUCKETS,
    SIZE_BUCKET_COLORS, SIZE_BUCKET_LABELS,
};
use crate::model::{DayRecord, FilterState, RepoRecord, Report};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

pub trait Aggregator {
    fn derive_repo_names(&self) -> Vec<String>;
    fn apply_filters(&self, filters: &FilterState) -> Report;
    fn compute_kpis(&self) -> KpiSet;
    fn chart_data(
        &self,
        kind: ChartKind,
        repo_names: &[String],
        selected: &IndexSet<String>,
    ) -> ChartData;
    fn top_active_hours(&self, repo_name: &str, count: usize) -> Vec<u32>;
    fn detail_rows(&self, repo_name: &str) -> Vec<DetailRow>;
}

impl Aggregator for Report {
    fn derive_repo_names(&self) -> Vec<String> {
        self.daily
            .iter()
            .flat_map(|day| day.repos.iter().map(|repo| repo.name.clone()))
            .unique()
            .collect()
    }

    fn apply_filters(&self, filters: &FilterState) -> Report {
        let daily = self
            .daily
            .iter()
            .filter(|day| filters.date_range.contains(day.date))
            .map(|day| DayRecord {
                date: day.date,
                repos: day
                    .repos
                    .iter()
                    .filter(|repo| filters.repos.contains(&repo.name))
                    .cloned()
                    .collect(),
            })
            .collect();
        Report {
            metadata: self.metadata.clone(),
            daily,
            aggregates: self.aggregates.clone(),
        }
    }

    fn compute_kpis(&self) -> KpiSet {
        let mut kpis = KpiSet::default();
        let mut success_acc = 0.0;
        let mut merge_times = Vec::new();
        let mut close_times = Vec::new();
        let mut commit_markers = 0;
        let mut pr_markers = 0;
        let mut bot_events = 0;

        for repo in self.daily.iter().flat_map(|day| &day.repos) {
            if let Some(commits) = &repo.commits {
                kpis.commits += commits.count;
                kpis.lines_added += commits.lines_added;
                kpis.lines_deleted += commits.lines_deleted;
            }
            if let Some(prs) = &repo.prs {
                kpis.prs_opened += prs.opened_count;
                kpis.prs_merged += prs.merged_count;
                if let Some(seconds) = prs.time_to_merge_seconds_median {
                    if seconds > 0.0 {
                        merge_times.push(seconds);
                    }
                }
            }
            if let Some(issues) = &repo.issues {
                if let Some(seconds) = issues.time_to_close_seconds_median {
                    if seconds > 0.0 {
                        close_times.push(seconds);
                    }
                }
            }
            if let Some(workflows) = &repo.workflows {
                kpis.workflow_runs += workflows.runs_count;
                if let Some(rate) = workflows.success_rate {
                    if workflows.runs_count > 0 {
                        success_acc += rate * workflows.runs_count as f64;
                    }
                }
            }
            if let Some(signals) = &repo.ai_signals {
                commit_markers += signals.commit_markers;
                pr_markers += signals.pr_markers;
                bot_events += signals.bot_actor_events;
            }
        }

        kpis.workflow_success_rate = if kpis.workflow_runs > 0 {
            success_acc / kpis.workflow_runs as f64 * 100.0
        } else {
            0.0
        };
        kpis.median_pr_merge_time = median(&merge_times);
        kpis.median_issue_close_time = median(&close_times);
        kpis.ai_markers = commit_markers + pr_markers;
        kpis.ai_signal_score = commit_markers + pr_markers * 2 + bot_events;
        kpis
    }

    fn chart_data(
        &self,
        kind: ChartKind,
        repo_names: &[String],
        selected: &IndexSet<String>,
    ) -> ChartData {
        match kind {
            ChartKind::Commits => commits_data(self, repo_names, selected),
            ChartKind::Lines => lines_data(self),
            ChartKind::Velocity => velocity_data(self),
            ChartKind::SizeDistribution => size_distribution_data(self),
            ChartKind::AiSignals => ai_signals_data(self),
            ChartKind::Workflow => workflow_data(self),
        }
    }

    fn top_active_hours(&self, repo_name: &str, count: usize) -> Vec<u32> {
        let mut hour_counts: IndexMap<u32, usize> = IndexMap::new();
        for day in &self.daily {
            let Some(repo) = find_repo(day, repo_name) else {
                continue;
            };
            let Some(patterns) = &repo.work_patterns else {
                continue;
            };
            for hour in &patterns.active_hours {
                *hour_counts.entry(*hour).or_insert(0) += 1;
            }
        }
        // Ties go to the earlier hour of the day.
        hour_counts
            .into_iter()
            .sorted_by(|(hour_a, count_a), (hour_b, count_b)| {
                count_b.cmp(count_a).then(hour_a.cmp(hour_b))
            })
            .take(count)
            .map(|(hour, _)| hour)
            .collect()
    }

    fn detail_rows(&self, repo_name: &str) -> Vec<DetailRow> {
        self.daily
            .iter()
            .filter_map(|day| {
                let repo = find_repo(day, repo_name)?;
                Some(DetailRow {
                    date: day.date,
                    commits: repo.commits.as_ref().map_or(0, |c| c.count),
                    prs_opened: repo.prs.as_ref().map_or(0, |p| p.opened_count),
                    prs_merged: repo.prs.as_ref().map_or(0, |p| p.merged_count),
                    lines_added: repo.commits.as_ref().map_or(0, |c| c.lines_added),
                    lines_deleted: repo.commits.as_ref().map_or(0, |c| c.lines_deleted),
                })
            })
            .collect()
    }
}

/// Sort ascending; odd count takes the middle element, even count the mean of
/// the middle two, empty input is 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn commits_data(report: &Report, repo_names: &[String], selected: &IndexSet<String>) -> ChartData {
    let mut series = Vec::new();
    for (index, name) in repo_names.iter().enumerate() {
        if !selected.contains(name) {
            continue;
        }
        let points = report
            .daily
            .iter()
            .map(|day| {
                let count = find_repo(day, name)
                    .and_then(|repo| repo.commits.as_ref())
                    .map_or(0, |commits| commits.count);
                Some(count as f64)
            })
            .collect();
        series.push(Series::new(name, points, repo_color(index)));
    }
    ChartData {
        labels: day_labels(report),
        series,
    }
}

fn lines_data(report: &Report) -> ChartData {
    let added = report
        .daily
        .iter()
        .map(|day| {
            let sum: u64 = day
                .repos
                .iter()
                .filter_map(|repo| repo.commits.as_ref())
                .map(|commits| commits.lines_added)
                .sum();
            Some(sum as f64)
        })
        .collect();
    let deleted = report
        .daily
        .iter()
        .map(|day| {
            let sum: u64 = day
                .repos
                .iter()
                .filter_map(|repo| repo.commits.as_ref())
                .map(|commits| commits.lines_deleted)
                .sum();
            Some(-(sum as f64))
        })
        .collect();
    ChartData {
        labels: day_labels(report),
        series: vec![
            Series::new("Lines Added", added, Color::GREEN),
            Series::new("Lines Deleted", deleted, Color::RED),
        ],
    }
}

fn velocity_data(report: &Report) -> ChartData {
    let points = report
        .daily
        .iter()
        .map(|day| {
            let merge_times = day
                .repos
                .iter()
                .filter_map(|repo| repo.prs.as_ref())
                .filter_map(|prs| prs.time_to_merge_seconds_median)
                .filter(|seconds| *seconds > 0.0)
                .collect::<Vec<_>>();
            if merge_times.is_empty() {
                None
            } else {
                Some((median(&merge_times) / 3600.0 * 10.0).round() / 10.0)
            }
        })
        .collect();
    ChartData {
        labels: day_labels(report),
        series: vec![Series::new(
            "Median PR Merge Time (hours)",
            points,
            Color::BLUE,
        )],
    }
}

fn size_distribution_data(report: &Report) -> ChartData {
    let mut totals = [0u64; SIZE_BUCKETS.len()];
    for repo in report.daily.iter().flat_map(|day| &day.repos) {
        let Some(prs) = &repo.prs else {
            continue;
        };
        for (bucket, count) in &prs.size_distribution {
            if let Some(slot) = SIZE_BUCKETS.iter().position(|name| name == bucket) {
                totals[slot] += count;
            }
        }
    }
    ChartData {
        labels: SIZE_BUCKET_LABELS.iter().map(|s| s.to_string()).collect(),
        series: vec![Series::new(
            "PR Sizes",
            totals.iter().map(|count| Some(*count as f64)).collect(),
            SIZE_BUCKET_COLORS[0],
        )],
    }
}

fn ai_signals_data(report: &Report) -> ChartData {
    let daily_sum = |pick: fn(&crate::model::AiSignalMetrics) -> u64| -> Vec<Option<f64>> {
        report
            .daily
            .iter()
            .map(|day| {
                let sum: u64 = day
                    .repos
                    .iter()
                    .filter_map(|repo| repo.ai_signals.as_ref())
                    .map(pick)
                    .sum();
                Some(sum as f64)
            })
            .collect()
    };
    ChartData {
        labels: day_labels(report),
        series: vec![
            Series::new(
                "Commit Markers",
                daily_sum(|signals| signals.commit_markers),
                Color::BLUE,
            ),
            Series::new(
                "PR Markers",
                daily_sum(|signals| signals.pr_markers),
                Color::EMERALD,
            ),
            Series::new(
                "Bot Events",
                daily_sum(|signals| signals.bot_actor_events),
                Color::AMBER,
            ),
        ],
    }
}

fn workflow_data(report: &Report) -> ChartData {
    let points = report
        .daily
        .iter()
        .map(|day| {
            let rates = day
                .repos
                .iter()
                .filter_map(|repo| repo.workflows.as_ref())
                .filter_map(|workflows| workflows.success_rate)
                .map(|rate| rate * 100.0)
                .collect::<Vec<_>>();
            if rates.is_empty() {
                None
            } else {
                Some(rates.iter().sum::<f64>() / rates.len() as f64)
            }
        })
        .collect();
    ChartData {
        labels: day_labels(report),
        series: vec![Series::new("Success Rate (%)", points, Color::GREEN)],
    }
}

fn day_labels(report: &Report) -> Vec<String> {
    report
        .daily
        .iter()
        .map(|day| day.date.format("%b %d").to_string())
        .collect()
}

fn find_repo<'a>(day: &'a DayRecord, name: &str) -> Option<&'a RepoRecord> {
    day.repos.iter().find(|repo| repo.name == name)
}
