use anyhow::Result;
use colored::Colorize;
use reaper_core::{CleanupOutcome, RunDisposition, RunSummary};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Table => {
            println!(
                "{} PR #{} (run {})",
                "Cleanup".cyan(),
                summary.pr,
                summary.run_id
            );
            if !summary.entries.is_empty() {
                println!("{}", render_table(summary));
            }
            let headline = headline(summary);
            if summary.has_failures() {
                print_error(&headline);
            } else {
                print_success(&headline);
            }
        }
    }
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_notice(msg: &str) {
    println!("{} {}", "•".yellow(), msg);
}

pub fn render_table(summary: &RunSummary) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Kind", "Identifier", "Outcome", "Detail"]);
    for entry in &summary.entries {
        let outcome = entry
            .outcome
            .as_ref()
            .map(CleanupOutcome::label)
            .unwrap_or("would delete");
        builder.push_record([
            entry.kind.as_str(),
            entry.identifier.as_deref().unwrap_or("-"),
            outcome,
            entry.detail.as_str(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn headline(summary: &RunSummary) -> String {
    match &summary.disposition {
        RunDisposition::Executed => format!(
            "{} deleted, {} failed in {} ms",
            summary.deleted_count(),
            summary.failed_count(),
            summary.duration_ms
        ),
        RunDisposition::NothingToClean => {
            format!("No resources found for PR #{}, nothing to clean", summary.pr)
        }
        RunDisposition::StateUnreadable { reason } => format!(
            "No resources found for PR #{} (state snapshot unreadable: {reason})",
            summary.pr
        ),
        RunDisposition::DryRun => "Dry run, nothing was deleted".to_string(),
    }
}
