//! Persisting and printing match results

use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{value_to_cell, MatchRecord};

/// Maximum characters of a match summary shown in the console
const SUMMARY_PREVIEW_CHARS: usize = 150;

/// Errors from writing reports
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Paths of a written report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub json_path: PathBuf,
    /// Only written when there is at least one match
    pub csv_path: Option<PathBuf>,
}

/// Base file name `matches_<field>_<country>_<timestamp>`
pub fn report_basename(field: &str, country: &str, timestamp: &str) -> String {
    format!("matches_{}_{}_{}", field.replace(' ', "_"), country, timestamp)
}

/// Write matches to `<output_dir>/matches_*.json` and, if non-empty, a sibling CSV
pub fn save_results(
    matches: &[MatchRecord],
    output_dir: &Path,
    field: &str,
    country: &str,
) -> Result<SavedReport, ReportError> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    save_results_at(matches, output_dir, &report_basename(field, country, &timestamp))
}

fn save_results_at(
    matches: &[MatchRecord],
    output_dir: &Path,
    basename: &str,
) -> Result<SavedReport, ReportError> {
    fs::create_dir_all(output_dir)?;

    let json_path = output_dir.join(format!("{}.json", basename));
    write_json(matches, &json_path)?;
    debug!("Wrote {} matches to {}", matches.len(), json_path.display());

    let csv_path = if matches.is_empty() {
        None
    } else {
        let path = output_dir.join(format!("{}.csv", basename));
        write_csv(matches, &path)?;
        debug!("Wrote CSV report to {}", path.display());
        Some(path)
    };

    Ok(SavedReport {
        json_path,
        csv_path,
    })
}

/// Pretty JSON, two-space indent, non-ASCII kept as is
fn write_json(matches: &[MatchRecord], path: &Path) -> Result<(), ReportError> {
    let mut file = fs::File::create(path)?;
    serde_json::to_writer_pretty(&mut file, matches)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// CSV with the first record's keys as header
fn write_csv(matches: &[MatchRecord], path: &Path) -> Result<(), ReportError> {
    let Some(first) = matches.first() else {
        return Ok(());
    };
    let header: Vec<&str> = first.keys().collect();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&header)?;

    for (idx, record) in matches.iter().enumerate() {
        let extra: Vec<&str> = record.keys().filter(|k| !header.contains(k)).collect();
        if !extra.is_empty() {
            warn!("Match {} has keys not in CSV header, dropping: {:?}", idx + 1, extra);
        }

        let row: Vec<String> = header
            .iter()
            .map(|key| record.get(key).map(value_to_cell).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Console listing of matches
pub fn render_summary(matches: &[MatchRecord]) -> String {
    let mut out = String::new();

    for record in matches {
        let field = |key: &str| record.display_field(key).unwrap_or_else(|| "N/A".to_string());

        out.push_str(&format!("\n{}. {}\n", field("rank"), field("title")));
        out.push_str(&format!("   Company: {}\n", field("company_or_institution")));
        out.push_str(&format!("   Fit Score: {}/100\n", field("fit_score")));
        out.push_str(&format!("   URL: {}\n", field("url")));

        if let Some(summary) = record.display_field("match_summary").filter(|s| !s.is_empty()) {
            let preview: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
            out.push_str(&format!("   Match: {}...\n", preview));
        }
    }

    out
}
