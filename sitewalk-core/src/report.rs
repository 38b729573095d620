// CSV tables and console summary for a finished crawl

use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use sitewalk_scanner::state::{CrawlState, Status, status_cell};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// File name prefix for the CSV tables: the base domain with `:` replaced.
pub fn report_file_stem(base_domain: &str) -> String {
    base_domain.replace(':', "_")
}

pub fn pages_csv_path(dir: &Path, base_domain: &str) -> PathBuf {
    dir.join(format!("{}_pages.csv", report_file_stem(base_domain)))
}

pub fn links_csv_path(dir: &Path, base_domain: &str) -> PathBuf {
    dir.join(format!("{}_links.csv", report_file_stem(base_domain)))
}

#[derive(Serialize)]
struct PageRow<'a> {
    page_url: &'a str,
    status_code: String,
    links: String,
}

#[derive(Serialize)]
struct LinkRow<'a> {
    link_url: &'a str,
    is_absolute: bool,
    opens_new_window: bool,
    scheme: &'a str,
    nofollow: bool,
    external: bool,
    status_code: String,
    page_count: usize,
}

/// One row per page record; the page's link observations are embedded as a JSON array.
pub fn write_pages_csv<W: Write>(writer: W, state: &CrawlState) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (url, record) in &state.pages {
        csv_writer.serialize(PageRow {
            page_url: url,
            status_code: status_cell(record.status_code),
            links: serde_json::to_string(&record.links)?,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// One row per link registry entry.
pub fn write_links_csv<W: Write>(writer: W, state: &CrawlState) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (url, entry) in state.links.iter() {
        csv_writer.serialize(LinkRow {
            link_url: url,
            is_absolute: entry.is_absolute,
            opens_new_window: entry.opens_new_window,
            scheme: &entry.scheme,
            nofollow: entry.nofollow,
            external: entry.external,
            status_code: status_cell(entry.status_code),
            page_count: entry.page_count(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes both tables into `dir` and returns their paths (pages, links).
pub fn save_csv_reports(
    dir: &Path,
    base_domain: &str,
    state: &CrawlState,
) -> Result<(PathBuf, PathBuf)> {
    let pages_path = pages_csv_path(dir, base_domain);
    write_pages_csv(File::create(&pages_path)?, state)?;

    let links_path = links_csv_path(dir, base_domain);
    write_links_csv(File::create(&links_path)?, state)?;

    Ok((pages_path, links_path))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLink {
    pub url: String,
    pub status: String,
    pub external: bool,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub base_domain: String,
    pub pages_crawled: usize,
    /// Page count per status; pages without a status are counted as "unknown".
    pub status_breakdown: BTreeMap<String, usize>,
    pub internal_links: usize,
    pub external_links: usize,
    pub broken_links: Vec<BrokenLink>,
}

impl CrawlSummary {
    pub fn from_state(seed: &str, base_domain: &str, state: &CrawlState) -> Self {
        let mut status_breakdown = BTreeMap::new();
        for record in state.pages.values() {
            *status_breakdown
                .entry(status_label(record.status_code))
                .or_insert(0) += 1;
        }

        let external_links = state.links.iter().filter(|(_, e)| e.external).count();

        let broken_links = state
            .links
            .iter()
            .filter(|(_, entry)| entry.status_code.is_some_and(|s| s.is_broken()))
            .map(|(url, entry)| BrokenLink {
                url: url.clone(),
                status: status_cell(entry.status_code),
                external: entry.external,
                page_count: entry.page_count(),
            })
            .collect();

        Self {
            seed: seed.to_string(),
            base_domain: base_domain.to_string(),
            pages_crawled: state.pages.len(),
            status_breakdown,
            internal_links: state.links.len() - external_links,
            external_links,
            broken_links,
        }
    }
}

fn colorize_status(status: &str) -> String {
    match status.parse::<u16>().ok() {
        Some(100..=199) => status.white().to_string(),
        Some(200..=299) => status.green().to_string(),
        Some(300..=399) => status.cyan().to_string(),
        Some(400..=499) => status.yellow().to_string(),
        Some(500..=599) => status.red().to_string(),
        Some(_) => status.to_string(),
        None => status.red().bold().to_string(),
    }
}

pub fn generate_text_report(summary: &CrawlSummary) -> String {
    let mut report = String::new();
    report.push_str(&format!("{}\n\n", DIVIDER.bright_blue()));
    report.push_str(&format!("{}\n", "# Summary:".bold()));
    report.push_str(&format!("  Seed: {}\n", summary.seed));
    report.push_str(&format!("  Pages crawled: {}\n", summary.pages_crawled));
    report.push_str(&format!("  Internal links: {}\n", summary.internal_links));
    report.push_str(&format!("  External links: {}\n", summary.external_links));

    report.push_str(&format!("\n{}\n", "## Page status".bold()));
    for (status, count) in &summary.status_breakdown {
        report.push_str(&format!("  {} {}\n", colorize_status(status), count));
    }

    report.push_str(&format!("\n{}\n", "## Broken links".bold()));
    if summary.broken_links.is_empty() {
        report.push_str(&format!("  {}\n", "none".green()));
    }
    for link in &summary.broken_links {
        let scope = if link.external { "external" } else { "internal" };
        report.push_str(&format!(
            "  {} {} ({}, {} page{})\n",
            colorize_status(&link.status),
            link.url,
            scope,
            link.page_count,
            if link.page_count == 1 { "" } else { "s" }
        ));
    }

    report.push_str(&format!("\n{}\n", DIVIDER.bright_blue()));
    report
}

pub fn generate_json_report(summary: &CrawlSummary) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Sitewalk",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": summary
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn render_report(summary: &CrawlSummary, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(summary)),
        ReportFormat::Json => Ok(generate_json_report(summary)?),
    }
}

/// Like [`status_cell`] but names the undetermined status.
pub fn status_label(status: Option<Status>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
