//! Output formatting for the CLI.

use crate::commands::check::CheckOutcome;
use crate::commands::run::ScenarioReport;
use crate::error::Result;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a scenario report.
    pub fn format_report(&self, report: &ScenarioReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => Ok(self.format_report_table(report)),
        }
    }

    /// Format the outcome of a requirement check.
    pub fn format_check(&self, outcome: &CheckOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
            OutputFormat::Table => {
                let detail = format!(
                    "require [{}] ignore [{}] against [{}]",
                    outcome.require, outcome.ignore, outcome.tags
                );
                if outcome.matched {
                    Ok(self.success(&format!("Requirement met: {}", detail)))
                } else {
                    Ok(self.error(&format!("Requirement not met: {}", detail)))
                }
            }
        }
    }

    fn format_report_table(&self, report: &ScenarioReport) -> String {
        let mut sections = Vec::new();

        sections.push(self.heading("Tag transitions"));
        if report.transitions.is_empty() {
            sections.push(self.colorize("No tag transitions.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Step", "Actor", "Tag", "Count", "State"]);
            for t in &report.transitions {
                let state = if t.count > 0 { "added" } else { "removed" };
                builder.push_record([
                    t.step.to_string(),
                    t.actor.clone(),
                    t.tag.clone(),
                    t.count.to_string(),
                    state.to_string(),
                ]);
            }
            sections.push(render(builder));
        }

        sections.push(self.heading("Stimuli delivered"));
        if report.deliveries.is_empty() {
            sections.push(self.colorize("No stimuli delivered.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Step", "Listener", "Target", "Broadcaster", "Location", "Age", "Strength"]);
            for d in &report.deliveries {
                builder.push_record([
                    d.step.to_string(),
                    d.listener.clone(),
                    d.target.clone(),
                    d.broadcaster.clone(),
                    format!("({:.1}, {:.1}, {:.1})", d.location[0], d.location[1], d.location[2]),
                    format!("{:.2}", d.age),
                    format!("{:.2}", d.strength),
                ]);
            }
            sections.push(render(builder));
        }

        if !report.checks.is_empty() {
            sections.push(self.heading("Requirement checks"));
            let mut builder = Builder::default();
            builder.push_record(["Step", "Actor", "Require", "Ignore", "Policy", "Result"]);
            for c in &report.checks {
                let result = match (c.matched, c.passed()) {
                    (true, true) => "match".to_string(),
                    (false, true) => "no match".to_string(),
                    (true, false) => "match (expected no match)".to_string(),
                    (false, false) => "no match (expected match)".to_string(),
                };
                let policy = match c.policy {
                    crate::cli::PolicyArg::Explicit => "explicit",
                    crate::cli::PolicyArg::IncludeParents => "include-parents",
                };
                builder.push_record([
                    c.step.to_string(),
                    c.actor.clone(),
                    c.require.clone(),
                    c.ignore.clone(),
                    policy.to_string(),
                    result,
                ]);
            }
            sections.push(render(builder));
        }

        if !report.final_tags.is_empty() {
            sections.push(self.heading("Final tags"));
            let mut builder = Builder::default();
            builder.push_record(["Actor", "Tags"]);
            for (actor, tags) in &report.final_tags {
                let tags: Vec<String> = tags
                    .iter()
                    .map(|(tag, count)| format!("{}={}", tag, count))
                    .collect();
                builder.push_record([actor.clone(), tags.join(", ")]);
            }
            sections.push(render(builder));
        }

        sections.push(report.metrics.summary.clone());
        sections.join("\n\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    fn heading(&self, title: &str) -> String {
        self.colorize(title, "cyan")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}
