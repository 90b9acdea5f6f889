//! Human-readable pass reports.

use crate::driver::{AgentReport, PassReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// One row per agent, then a fragment table per agent and the failures.
pub fn format_pass_report_text(report: &PassReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Agents")));
    if report.agents.is_empty() && report.failures.is_empty() {
        out.push_str("No agents found.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Agent", "Artifact", "Workers", "Inputs", "Routes", "Errors", "Written"]);
    for agent in &report.agents {
        table.add_row(vec![
            agent.agent.to_string(),
            agent.artifact.clone(),
            agent.workers.to_string(),
            agent.inputs.to_string(),
            agent.routes().to_string(),
            agent.error_count().to_string(),
            written_label(agent).to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));

    for agent in &report.agents {
        if let Some(error) = &agent.error {
            out.push_str(&format!("{}: {}\n", agent.agent, error.red()));
        }
        if agent.fragments.is_empty() {
            continue;
        }
        out.push_str(&format!("{}\n\n", format_section_heading(&format!("Fragments of {}", agent.agent))));
        out.push_str(&format!("{}\n\n", format_fragment_table(agent)));
    }

    if !report.failures.is_empty() {
        out.push_str(&format!("{}\n\n", format_section_heading("Aborted")));
        for failure in &report.failures {
            let hint = if failure.retryable { " (retryable)" } else { "" };
            out.push_str(&format!("  {}: {}{}\n", failure.agent, failure.error, hint));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Total: {} agents, {} written, {} errors in {} ms ({} attempt{}).\n",
        report.agents.len(),
        report.written(),
        report.error_count(),
        report.duration_ms,
        report.attempts,
        if report.attempts == 1 { "" } else { "s" }
    ));
    out
}

fn format_fragment_table(agent: &AgentReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Fragment", "Label", "Filters", "Outputs", "Error"]);
    for fragment in &agent.fragments {
        table.add_row(vec![
            fragment.fragment.to_string(),
            fragment.label.clone().unwrap_or_else(|| "-".to_string()),
            fragment.filters.to_string(),
            fragment.outputs.to_string(),
            fragment.error.clone().unwrap_or_default(),
        ]);
    }
    table
}

fn written_label(agent: &AgentReport) -> &'static str {
    if agent.skipped {
        "skipped"
    } else if agent.written {
        "yes"
    } else {
        "unchanged"
    }
}
