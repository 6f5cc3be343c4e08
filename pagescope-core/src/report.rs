// Report rendering for a finished page analysis

use crate::analysis::PageAnalysis;
use colored::{ColoredString, Colorize};
use pagescope_scanner::LinkCategory;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

pub fn render(analysis: &PageAnalysis, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(render_report(analysis)),
        ReportFormat::Json => render_json(analysis),
    }
}

pub fn render_json(analysis: &PageAnalysis) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(analysis)
}

fn section(report: &mut String, title: &str) {
    report.push_str(&format!("{}\n", RULE.bright_blue()));
    report.push_str(&format!("{}\n", title.bold()));
    report.push_str(&format!("{}\n\n", RULE.bright_blue()));
}

fn score_badge(score: u32) -> ColoredString {
    let text = format!("{}/100", score);
    match score {
        80.. => text.green().bold(),
        50..=79 => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

fn or_missing(value: Option<&str>) -> ColoredString {
    match value {
        Some(v) => v.normal(),
        None => "(missing)".dimmed(),
    }
}

pub fn render_report(analysis: &PageAnalysis) -> String {
    let mut report = String::new();

    report.push_str(&format!("{}\n", RULE.bright_blue()));
    report.push_str(&format!("{}\n", "                          PAGESCOPE SEO REPORT".bold()));
    report.push_str(&format!("{}\n\n", RULE.bright_blue()));

    report.push_str(&format!("URL:          {}\n", analysis.url));
    if analysis.final_url.trim_end_matches('/') != analysis.url.trim_end_matches('/') {
        report.push_str(&format!("Final URL:    {}\n", analysis.final_url));
    }
    report.push_str(&format!("Analyzed:     {}\n", analysis.analyzed_at));
    report.push_str(&format!("Score:        {}\n\n", score_badge(analysis.score.score)));

    section(&mut report, "PAGE");
    report.push_str(&format!("Title:        {}\n", or_missing(analysis.title.as_deref())));
    report.push_str(&format!(
        "Description:  {}\n",
        or_missing(analysis.meta_description.as_deref())
    ));
    report.push_str(&format!("Canonical:    {}\n", or_missing(analysis.canonical.as_deref())));
    report.push_str(&format!("Language:     {}\n", or_missing(analysis.lang.as_deref())));
    report.push_str(&format!("Words:        {}\n", analysis.word_count));
    let h = &analysis.headings;
    report.push_str(&format!(
        "Headings:     h1 {}  h2 {}  h3 {}  h4 {}  h5 {}  h6 {}\n",
        h.h1.len(),
        h.h2.len(),
        h.h3.len(),
        h.h4.len(),
        h.h5.len(),
        h.h6.len()
    ));
    report.push_str(&format!(
        "Images:       {} total, {} missing alt\n",
        analysis.images.total, analysis.images.missing_alt
    ));
    let data = &analysis.structured_data;
    if data.is_present() {
        let types: Vec<&str> = data
            .json_ld_types
            .iter()
            .chain(&data.microdata_types)
            .map(String::as_str)
            .collect();
        report.push_str(&format!("Schema:       {}\n", types.join(", ")));
    } else {
        report.push_str(&format!("Schema:       {}\n", "(none)".dimmed()));
    }
    report.push('\n');

    section(&mut report, "LINKS");
    let links = &analysis.links;
    report.push_str(&format!("Internal:           {}\n", links.internal_links.len()));
    report.push_str(&format!("External dofollow:  {}\n", links.external_dofollow_links.len()));
    report.push_str(&format!("External nofollow:  {}\n", links.external_nofollow_links.len()));
    if links.links_verified {
        report.push_str(&format!("Checked:            {} unique\n", links.unique_links_checked));
        report.push_str(&format!(
            "Broken:             {}\n",
            links.confirmed_broken_links_count.to_string().red().bold()
        ));
        report.push_str(&format!(
            "Network issues:     {}\n",
            links.network_issue_links_count.to_string().yellow()
        ));

        if !links.broken_links.is_empty() {
            report.push('\n');
            for record in &links.broken_links {
                let marker = match record.category {
                    LinkCategory::ClientError | LinkCategory::ServerError => "✗".red().bold(),
                    LinkCategory::NetworkIssue => "!".yellow().bold(),
                    _ => "?".dimmed(),
                };
                report.push_str(&format!(
                    "  {} [{}] {}  ({})\n",
                    marker, record.status, record.url, record.category
                ));
            }
        }
    } else {
        report.push_str(&format!("{}\n", "Link verification skipped".dimmed()));
    }
    report.push('\n');

    if !analysis.keywords.is_empty() || analysis.keyword_error.is_some() {
        section(&mut report, "KEYWORDS");
        if !analysis.keywords.is_empty() {
            report.push_str(&wrap_text(&analysis.keywords.join(", "), 80, "  "));
        }
        if let Some(error) = &analysis.keyword_error {
            report.push_str(&format!("  {} {}\n", "!".yellow().bold(), error));
        }
        report.push('\n');
    }

    section(&mut report, "FINDINGS");
    for strength in &analysis.score.strengths {
        report.push_str(&format!("  {} {}\n", "✓".green().bold(), strength));
    }
    for issue in &analysis.score.issues {
        report.push_str(&format!("  {} {}\n", "✗".red(), issue));
    }
    if analysis.score.strengths.is_empty() && analysis.score.issues.is_empty() {
        report.push_str("  Nothing to report\n");
    }
    report.push('\n');

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 > width - indent.len() && !current_line.is_empty() {
            result.push_str(indent);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}
