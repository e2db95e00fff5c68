mod analyze;
mod app;
mod chart;
mod model;
mod report;
mod utils;

use crate::app::{ChartId, DashboardApp, Event};
use crate::model::{Report, Result};
use crate::report::MarkdownDashboard;
use crate::utils::{MultiProgressExt, ProgressTemplate};
use chrono::NaiveDate;
use clap::Parser;
use indexmap::IndexSet;
use indicatif::{MultiProgress, ProgressBar};
use std::fs;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug, Clone)]
struct Args {
    #[arg(long = "report", default_value = "work_review.json")]
    report_path: String,
    #[arg(long = "out_dir", default_value = "dashboard")]
    out_dir: String,
    /// Comma-separated repositories to keep selected (default: all).
    #[arg(long = "repos")]
    repos: Option<String>,
    /// Quick range: the most recent N calendar days of the report.
    #[arg(long = "last_days")]
    last_days: Option<u32>,
    #[arg(long = "from")]
    from: Option<NaiveDate>,
    #[arg(long = "to")]
    to: Option<NaiveDate>,
    #[arg(long = "detail_repo")]
    detail_repo: Option<String>,
    #[arg(long = "chart_width", default_value_t = 800)]
    chart_width: u32,
    #[arg(long = "chart_height", default_value_t = 400)]
    chart_height: u32,
    /// Leave the collection-notes banner out of the dashboard document.
    #[arg(long = "no_notes", default_value_t = false)]
    no_notes: bool,
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    if let Err(err) = run(&args).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let multi_progress = MultiProgress::default();

    let report_pb = multi_progress.add_with_style(
        ProgressBar::no_length(),
        ProgressTemplate::message(),
    );
    report_pb.set_message(format!("Read report `{}` ...", args.report_path));
    let report = match Report::load(&args.report_path) {
        Ok(report) => report,
        Err(err) => {
            report_pb.finish_with_message("Failed to load report");
            eprintln!("Failed to load dashboard data: {err}");
            std::process::exit(1);
        }
    };
    report_pb.finish_with_message(format!(
        "✅ Completed parsing report `{}` (find {} days)",
        args.report_path,
        report.daily.len()
    ));

    let mut app = DashboardApp::new(report).with_export_dir(&args.out_dir);
    replay_selection(&mut app, args)?;
    app.settle().await;

    fs::create_dir_all(&args.out_dir)?;

    let charts_pb = multi_progress.add_with_style(
        ProgressBar::new(ChartId::ALL.len() as u64),
        ProgressTemplate::steps(),
    );
    charts_pb.set_message("Rendering charts");
    for id in ChartId::ALL {
        app.dispatch(Event::ExportRequested { chart: id })?;
        charts_pb.inc(1);
    }
    charts_pb.finish_with_message("✅ Completed chart export");

    let doc_pb = multi_progress.add_with_style(
        ProgressBar::no_length(),
        ProgressTemplate::message(),
    );
    doc_pb.set_message("Writing dashboard document ...");
    let doc_path = Path::new(&args.out_dir).join("dashboard.md");
    app.dashboard_create(&doc_path)?;
    doc_pb.finish_with_message(format!(
        "✅ Dashboard written to `{}` ({} days, {} repositories)",
        doc_path.display(),
        app.filtered().daily.len(),
        app.repo_names().len()
    ));

    Ok(())
}

/// Replays the CLI selection as dashboard events so the whole run goes
/// through the same dispatch path an interactive surface would use.
fn replay_selection(app: &mut DashboardApp, args: &Args) -> Result<()> {
    if let Some(keep) = &args.repos {
        let keep = keep
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<IndexSet<_>>();
        for name in app.repo_names().to_vec() {
            if !keep.contains(&name) {
                app.dispatch(Event::RepoToggled {
                    name,
                    selected: false,
                })?;
            }
        }
    }
    if let Some(days) = args.last_days {
        app.dispatch(Event::QuickRangeSelected { days })?;
    }
    if let (Some(start), Some(end)) = (args.from, args.to) {
        app.dispatch(Event::RangeChanged { start, end })?;
    }
    if let Some(name) = &args.detail_repo {
        app.dispatch(Event::DetailRepoSelected { name: name.clone() })?;
    }
    if args.no_notes {
        app.dispatch(Event::BannerDismissed)?;
    }
    app.dispatch(Event::SurfaceResized {
        width: args.chart_width,
        height: args.chart_height,
    })?;
    Ok(())
}
