// Tests for report generation functionality

use pagescope_core::analysis::PageAnalysis;
use pagescope_core::extract::{Headings, ImageSummary, StructuredData};
use pagescope_core::report::{ReportFormat, render, render_json, render_report, save_report};
use pagescope_core::scoring::SeoScore;
use pagescope_scanner::{BrokenLinkRecord, LinkAnalysis, LinkCategory, LinkStatus};

fn sample_analysis() -> PageAnalysis {
    PageAnalysis {
        url: "https://clayworks.example/".to_string(),
        final_url: "https://clayworks.example/shop".to_string(),
        analyzed_at: "2026-10-14T09:30:00Z".to_string(),
        title: Some("Clayworks Shop".to_string()),
        meta_description: None,
        canonical: None,
        lang: Some("en".to_string()),
        has_viewport: true,
        word_count: 420,
        headings: Headings {
            h1: vec!["Shop".to_string()],
            sequence: vec![1],
            ..Headings::default()
        },
        images: ImageSummary {
            total: 3,
            with_alt: 2,
            missing_alt: 1,
            missing_alt_sources: vec!["/hero.jpg".to_string()],
        },
        structured_data: StructuredData {
            json_ld_types: vec!["Store".to_string()],
            json_ld_blocks: 1,
            ..StructuredData::default()
        },
        links: LinkAnalysis {
            internal_links: vec!["https://clayworks.example/about".to_string()],
            broken_links: vec![
                BrokenLinkRecord {
                    url: "https://clayworks.example/old".to_string(),
                    status: LinkStatus::Code(404),
                    category: LinkCategory::ClientError,
                },
                BrokenLinkRecord {
                    url: "https://gone.example/".to_string(),
                    status: LinkStatus::label("DNS Resolution Failed"),
                    category: LinkCategory::NetworkIssue,
                },
            ],
            confirmed_broken_links_count: 1,
            network_issue_links_count: 1,
            links_verified: true,
            unique_links_checked: 3,
            ..LinkAnalysis::default()
        },
        keywords: vec!["stoneware".to_string(), "ceramic mugs".to_string()],
        keyword_error: None,
        score: SeoScore {
            score: 64,
            strengths: vec!["Page has exactly one <h1>".to_string()],
            issues: vec!["Page has no meta description".to_string()],
        },
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("csv"), None);
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_sections() {
    colored::control::set_override(false);
    let report = render_report(&sample_analysis());

    assert!(report.contains("PAGESCOPE SEO REPORT"));
    assert!(report.contains("Final URL:    https://clayworks.example/shop"));
    assert!(report.contains("Score:        64/100"));
    assert!(report.contains("Description:  (missing)"));
    assert!(report.contains("Schema:       Store"));
    assert!(report.contains("Images:       3 total, 1 missing alt"));
    assert!(report.contains("[404] https://clayworks.example/old  (ClientError)"));
    assert!(report.contains("[DNS Resolution Failed] https://gone.example/  (NetworkIssue)"));
    assert!(report.contains("stoneware, ceramic mugs"));
    assert!(report.contains("Page has no meta description"));
}

#[test]
fn test_text_report_without_link_check() {
    colored::control::set_override(false);
    let mut analysis = sample_analysis();
    analysis.links = LinkAnalysis::default();
    analysis.keywords.clear();

    let report = render_report(&analysis);
    assert!(report.contains("Link verification skipped"));
    assert!(!report.contains("KEYWORDS"));
}

#[test]
fn test_text_report_shows_keyword_error() {
    colored::control::set_override(false);
    let mut analysis = sample_analysis();
    analysis.keywords.clear();
    analysis.keyword_error =
        Some("No API key: set the OPENAI_API_KEY environment variable".to_string());

    let report = render_report(&analysis);
    assert!(report.contains("KEYWORDS"));
    assert!(report.contains("OPENAI_API_KEY"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_is_camel_case() {
    let json = render_json(&sample_analysis()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["finalUrl"], "https://clayworks.example/shop");
    assert_eq!(value["confirmedBrokenLinksCount"], 1);
    assert_eq!(value["networkIssueLinksCount"], 1);
    assert_eq!(value["brokenLinks"][0]["status"], 404);
    assert_eq!(value["brokenLinks"][1]["status"], "DNS Resolution Failed");
    assert_eq!(value["score"], 64);
    assert!(value["metaDescription"].is_null());
}

#[test]
fn test_json_report_round_trips() {
    let analysis = sample_analysis();
    let json = render(&analysis, ReportFormat::Json).unwrap();
    let parsed: PageAnalysis = serde_json::from_str(&json).unwrap();

    // heading order is not part of the wire format
    let mut expected = analysis;
    expected.headings.sequence.clear();
    assert_eq!(parsed, expected);
}

#[test]
fn test_save_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    save_report("{}", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
}
