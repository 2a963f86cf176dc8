//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use lodestone_domain::{Identity, MemberMetrics, ProfileSummary};
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

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

    /// Format a resolved identity.
    pub fn format_identity(&self, identity: &Identity) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(identity),
            OutputFormat::Table => Ok(table(
                ["ID", "Name"],
                [[identity.id.to_string(), identity.name.to_string()]],
            )),
        }
    }

    /// Format a profile list.
    pub fn format_profiles(&self, profiles: &[ProfileSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(&profiles),
            OutputFormat::Table if profiles.is_empty() => Ok(self.colorize("No profiles found.", "yellow")),
            OutputFormat::Table => {
                let rows = profiles.iter().map(|p| {
                    let active = if p.is_active {
                        self.colorize("yes", "green")
                    } else {
                        "no".to_string()
                    };
                    [
                        p.profile_id.to_string(),
                        p.label.to_string(),
                        p.mode.as_str().to_string(),
                        active,
                    ]
                });
                Ok(table(["Profile ID", "Label", "Mode", "Active"], rows))
            }
        }
    }

    /// Format a member's derived metrics.
    pub fn format_metrics(&self, metrics: &MemberMetrics) -> Result<String> {
        match self.format {
            OutputFormat::Json => json(metrics),
            OutputFormat::Table => {
                let summary = table(
                    ["Level", "Budget", "Nodes"],
                    [[
                        metrics.level.to_string(),
                        metrics.budget.to_string(),
                        metrics.node_levels.len().to_string(),
                    ]],
                );
                let resources = table(
                    ["Resource", "Owned", "Consumed", "Total"],
                    metrics.resources.iter().map(|r| {
                        [
                            r.kind.as_str().to_string(),
                            r.owned.to_string(),
                            r.consumed.to_string(),
                            r.total.to_string(),
                        ]
                    }),
                );
                Ok(format!("{}\n{}", summary, resources))
            }
        }
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn table<const N: usize>(
    header: [&str; N],
    rows: impl IntoIterator<Item = [String; N]>,
) -> String {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}
