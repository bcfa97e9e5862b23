//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;
use crate::core::{load_snapshot, BomGraph};

/// Load a snapshot file or directory and index it
pub fn load_graph(path: &Path) -> Result<BomGraph> {
    let snapshot = load_snapshot(path)?;
    Ok(BomGraph::from_snapshot(snapshot)?)
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Money with two decimals, "-" when not computed
pub fn format_cost(cost: Option<f64>) -> String {
    cost.map_or_else(|| "-".to_string(), |c| format!("{:.2}", c))
}

/// Seconds as `1h 02m 05s` / `2m 05s` / `45.0s`
pub fn format_seconds(secs: f64) -> String {
    if secs < 60.0 {
        return format!("{:.1}s", secs);
    }
    let total = secs.round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else {
        format!("{}m {:02}s", m, s)
    }
}

/// Render rows as a table in one of the tabular formats
///
/// YAML and JSON are handled by the caller with serde; asking for them here
/// falls back to the human layout.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Tsv => {
            let mut out = headers.join("\t");
            out.push('\n');
            for row in rows {
                out.push_str(&row.join("\t"));
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(headers).into_diagnostic()?;
            for row in rows {
                writer.write_record(row).into_diagnostic()?;
            }
            let bytes = writer.into_inner().into_diagnostic()?;
            String::from_utf8(bytes).into_diagnostic()
        }
        OutputFormat::Md => Ok(format!("{}\n", build_table(headers, rows).with(Style::markdown()))),
        OutputFormat::Auto | OutputFormat::Yaml | OutputFormat::Json => {
            Ok(format!("{}\n", build_table(headers, rows).with(Style::rounded())))
        }
    }
}

fn build_table(headers: &[&str], rows: &[Vec<String>]) -> tabled::Table {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    builder.build()
}
