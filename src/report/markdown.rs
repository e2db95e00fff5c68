use crate::analyze::{DetailRow, KpiSet};
use crate::app::{ChartId, DashboardApp};
use crate::model::{Metadata, Result};
use markdown_builder::Markdown;
use markdown_table::{Heading, MarkdownTable};
use std::fs;
use std::path::Path;
use tracing::info;

pub trait MarkdownDashboard {
    fn dashboard_create(&self, path: &Path) -> Result<()>;
}

impl MarkdownDashboard for DashboardApp {
    fn dashboard_create(&self, path: &Path) -> Result<()> {
        let mut doc = Markdown::new();

        doc.add_title(&self.report().metadata);
        if self.banner_visible() {
            if let Some(notes) = &self.report().metadata.collection_notes {
                doc.add_notes(notes);
            }
        }
        doc.add_kpis(self.kpis())?;
        doc.add_charts();
        if let Some(repo) = self.detail_repo() {
            doc.add_detail(repo, &self.detail_rows(), &self.top_active_hours())?;
        }

        fs::write(path, doc.render())?;
        info!("Dashboard written to {}", path.display());
        Ok(())
    }
}

trait MarkdownExt {
    fn add_title(&mut self, metadata: &Metadata);
    fn add_notes(&mut self, notes: &str);
    fn add_kpis(&mut self, kpis: &KpiSet) -> Result<()>;
    fn add_charts(&mut self);
    fn add_detail(&mut self, repo: &str, rows: &[DetailRow], hours: &[u32]) -> Result<()>;
}

impl MarkdownExt for Markdown {
    fn add_title(&mut self, metadata: &Metadata) {
        if metadata.owner.is_empty() {
            self.header1("Daily Dev Story");
        } else {
            self.header1(format!("Daily Dev Story — {}", metadata.owner));
        }
        if let Some(window) = &metadata.window {
            self.paragraph(format!(
                "{} — {}",
                window.start_date.format("%d.%m.%Y"),
                window.end_date.format("%d.%m.%Y"),
            ));
        }
    }

    fn add_notes(&mut self, notes: &str) {
        self.paragraph(format!("*{notes}*"));
    }

    fn add_kpis(&mut self, kpis: &KpiSet) -> Result<()> {
        self.header2("Key Indicators");

        let rows = vec![
            vec!["Commits".to_string(), kpis.commits.to_string()],
            vec!["PRs Opened".to_string(), kpis.prs_opened.to_string()],
            vec!["PRs Merged".to_string(), kpis.prs_merged.to_string()],
            vec!["Lines Added".to_string(), kpis.lines_added.to_string()],
            vec!["Lines Deleted".to_string(), kpis.lines_deleted.to_string()],
            vec![
                "Workflow Success Rate".to_string(),
                format_percent(kpis.workflow_success_rate),
            ],
            vec![
                "Median PR Merge Time".to_string(),
                format_duration(kpis.median_pr_merge_time),
            ],
            vec![
                "Median Issue Close Time".to_string(),
                format_duration(kpis.median_issue_close_time),
            ],
            vec!["AI Markers".to_string(), kpis.ai_markers.to_string()],
            vec!["AI Signal Score".to_string(), kpis.ai_signal_score.to_string()],
        ];

        let mut table = MarkdownTable::new(rows);
        table.with_headings(vec![
            Heading::new("Metric".to_string(), None),
            Heading::new("Value".to_string(), None),
        ]);
        self.paragraph(
            table
                .as_markdown()
                .map_err(|err| format!("render KPI table: {err:?}"))?,
        );
        Ok(())
    }

    fn add_charts(&mut self) {
        self.header2("Charts");
        for id in ChartId::ALL {
            self.paragraph(format!("![{}]({})", id.title(), id.export_file_name()));
        }
    }

    fn add_detail(&mut self, repo: &str, rows: &[DetailRow], hours: &[u32]) -> Result<()> {
        self.header2(format!("Repository Detail — {repo}"));

        if hours.is_empty() {
            self.paragraph("No activity data".to_string());
        } else {
            let hours = hours
                .iter()
                .map(|hour| format!("{hour}:00"))
                .collect::<Vec<_>>()
                .join(", ");
            self.paragraph(format!("Most active hours: {hours}"));
        }

        let rows = rows
            .iter()
            .map(|row| {
                vec![
                    row.date.format("%d.%m.%Y").to_string(),
                    row.commits.to_string(),
                    row.prs_opened.to_string(),
                    row.prs_merged.to_string(),
                    format!("+{}", row.lines_added),
                    format!("-{}", row.lines_deleted),
                ]
            })
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return Ok(());
        }

        let mut table = MarkdownTable::new(rows);
        table.with_headings(vec![
            Heading::new("Date".to_string(), None),
            Heading::new("Commits".to_string(), None),
            Heading::new("PRs Opened".to_string(), None),
            Heading::new("PRs Merged".to_string(), None),
            Heading::new("Lines Added".to_string(), None),
            Heading::new("Lines Deleted".to_string(), None),
        ]);
        self.paragraph(
            table
                .as_markdown()
                .map_err(|err| format!("render detail table: {err:?}"))?,
        );
        Ok(())
    }
}

fn format_percent(rate: f64) -> String {
    format!("{}%", rate.round() as i64)
}

fn format_duration(seconds: f64) -> String {
    if seconds <= 0.0 {
        return "—".to_string();
    }
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}
