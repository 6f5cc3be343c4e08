// Weighted SEO scoring over extracted signals and link results

use crate::extract::PageSignals;
use pagescope_scanner::LinkAnalysis;
use serde::{Deserialize, Serialize};

pub const TITLE_WEIGHT: u32 = 20;
pub const META_WEIGHT: u32 = 20;
pub const HEADINGS_WEIGHT: u32 = 15;
pub const IMAGES_WEIGHT: u32 = 15;
pub const LINKS_WEIGHT: u32 = 15;
pub const STRUCTURED_DATA_WEIGHT: u32 = 15;

const TITLE_LENGTH: std::ops::RangeInclusive<usize> = 30..=60;
const META_LENGTH: std::ops::RangeInclusive<usize> = 70..=160;
const THIN_CONTENT_WORDS: usize = 300;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoScore {
    pub score: u32,
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
}

#[derive(Default)]
struct Tally {
    points: u32,
    strengths: Vec<String>,
    issues: Vec<String>,
}

impl Tally {
    fn award(&mut self, points: u32) {
        self.points += points;
    }

    fn strength(&mut self, message: impl Into<String>) {
        self.strengths.push(message.into());
    }

    fn issue(&mut self, message: impl Into<String>) {
        self.issues.push(message.into());
    }
}

pub fn score_page(signals: &PageSignals, links: &LinkAnalysis) -> SeoScore {
    let mut tally = Tally::default();

    score_title(signals, &mut tally);
    score_meta_description(signals, &mut tally);
    score_headings(signals, &mut tally);
    score_images(signals, &mut tally);
    score_links(links, &mut tally);
    score_structured_data(signals, &mut tally);
    note_unscored(signals, &mut tally);

    SeoScore {
        score: tally.points.min(100),
        strengths: tally.strengths,
        issues: tally.issues,
    }
}

fn score_title(signals: &PageSignals, tally: &mut Tally) {
    let Some(title) = &signals.title else {
        tally.issue("Page has no <title>");
        return;
    };
    let length = title.chars().count();
    if TITLE_LENGTH.contains(&length) {
        tally.award(TITLE_WEIGHT);
        tally.strength(format!("Title length ({} characters) is in the recommended range", length));
    } else {
        tally.award(TITLE_WEIGHT / 2);
        tally.issue(format!(
            "Title is {} characters; aim for {}-{}",
            length,
            TITLE_LENGTH.start(),
            TITLE_LENGTH.end()
        ));
    }
}

fn score_meta_description(signals: &PageSignals, tally: &mut Tally) {
    let Some(description) = &signals.meta_description else {
        tally.issue("Page has no meta description");
        return;
    };
    let length = description.chars().count();
    if META_LENGTH.contains(&length) {
        tally.award(META_WEIGHT);
        tally.strength("Meta description length is in the recommended range");
    } else {
        tally.award(META_WEIGHT / 2);
        tally.issue(format!(
            "Meta description is {} characters; aim for {}-{}",
            length,
            META_LENGTH.start(),
            META_LENGTH.end()
        ));
    }
}

fn score_headings(signals: &PageSignals, tally: &mut Tally) {
    let headings = &signals.headings;
    match headings.h1.len() {
        0 => tally.issue("Page has no <h1>"),
        1 => {
            tally.award(8);
            tally.strength("Page has exactly one <h1>");
        }
        n => {
            tally.award(4);
            tally.issue(format!("Page has {} <h1> elements; use one", n));
        }
    }

    if headings.h2.is_empty() {
        tally.issue("Page has no <h2> subheadings");
    } else {
        tally.award(4);
    }

    if headings.total() > 0 {
        if headings.skips_levels() {
            tally.issue("Heading levels are skipped (e.g. <h2> followed by <h4>)");
        } else {
            tally.award(3);
        }
    }
}

fn score_images(signals: &PageSignals, tally: &mut Tally) {
    let images = &signals.images;
    tally.award((IMAGES_WEIGHT as f64 * images.alt_coverage()).round() as u32);
    if images.total == 0 {
        return;
    }
    if images.missing_alt == 0 {
        tally.strength(format!("All {} image(s) have alt text", images.total));
    } else {
        tally.issue(format!(
            "{} of {} image(s) are missing alt text",
            images.missing_alt, images.total
        ));
    }
}

fn score_links(links: &LinkAnalysis, tally: &mut Tally) {
    if links.internal_links.is_empty() {
        tally.issue("Page has no internal links");
    } else {
        tally.award(5);
        tally.strength(format!("Page has {} internal link(s)", links.internal_links.len()));
    }

    let health = LINKS_WEIGHT - 5;
    if !links.links_verified {
        tally.award(health);
        return;
    }

    let confirmed = u32::try_from(links.confirmed_broken_links_count).unwrap_or(u32::MAX);
    if confirmed == 0 {
        tally.award(health);
        tally.strength("No broken links found");
    } else {
        tally.award(health.saturating_sub(confirmed.saturating_mul(2)));
        tally.issue(format!(
            "{} broken link(s) found",
            links.confirmed_broken_links_count
        ));
    }

    if links.network_issue_links_count > 0 {
        tally.issue(format!(
            "{} link(s) could not be reached due to network issues",
            links.network_issue_links_count
        ));
    }
}

fn score_structured_data(signals: &PageSignals, tally: &mut Tally) {
    let data = &signals.structured_data;
    if !data.is_present() {
        tally.issue("No structured data (JSON-LD or microdata) found");
        return;
    }

    let mut types: Vec<&str> = data.json_ld_types.iter().map(String::as_str).collect();
    types.extend(data.microdata_types.iter().map(String::as_str));
    tally.strength(format!("Structured data found: {}", types.join(", ")));

    if data.invalid_json_ld_blocks > 0 {
        tally.award(STRUCTURED_DATA_WEIGHT - 5);
        tally.issue(format!(
            "{} JSON-LD block(s) could not be parsed",
            data.invalid_json_ld_blocks
        ));
    } else {
        tally.award(STRUCTURED_DATA_WEIGHT);
    }
}

// reported, not weighted
fn note_unscored(signals: &PageSignals, tally: &mut Tally) {
    if signals.lang.is_none() {
        tally.issue("<html> element has no lang attribute");
    }
    if !signals.has_viewport {
        tally.issue("No viewport meta tag; page may not be mobile friendly");
    }
    if signals.canonical.is_none() {
        tally.issue("No canonical link");
    }
    if signals.word_count < THIN_CONTENT_WORDS {
        tally.issue(format!(
            "Thin content: {} words (fewer than {})",
            signals.word_count, THIN_CONTENT_WORDS
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Headings, ImageSummary, StructuredData};

    fn strong_page() -> PageSignals {
        PageSignals {
            title: Some("Handmade Ceramic Mugs from a Small Studio".to_string()),
            meta_description: Some(
                "Small-batch stoneware mugs, thrown on the wheel and glazed by hand in our studio."
                    .to_string(),
            ),
            canonical: Some("https://clayworks.example/mugs".to_string()),
            lang: Some("en".to_string()),
            has_viewport: true,
            headings: Headings {
                h1: vec!["Mugs".to_string()],
                h2: vec!["Glazes".to_string()],
                sequence: vec![1, 2],
                ..Headings::default()
            },
            images: ImageSummary {
                total: 2,
                with_alt: 2,
                ..ImageSummary::default()
            },
            structured_data: StructuredData {
                json_ld_types: vec!["Product".to_string()],
                json_ld_blocks: 1,
                ..StructuredData::default()
            },
            word_count: 800,
            anchors: Vec::new(),
        }
    }

    fn healthy_links() -> LinkAnalysis {
        LinkAnalysis {
            internal_links: vec!["https://clayworks.example/about".to_string()],
            links_verified: true,
            ..LinkAnalysis::default()
        }
    }

    #[test]
    fn test_weights_sum_to_100() {
        assert_eq!(
            TITLE_WEIGHT
                + META_WEIGHT
                + HEADINGS_WEIGHT
                + IMAGES_WEIGHT
                + LINKS_WEIGHT
                + STRUCTURED_DATA_WEIGHT,
            100
        );
    }

    #[test]
    fn test_perfect_page() {
        let result = score_page(&strong_page(), &healthy_links());
        assert_eq!(result.score, 100);
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert!(result.strengths.iter().any(|s| s == "No broken links found"));
    }

    #[test]
    fn test_empty_page_scores_low() {
        let result = score_page(&PageSignals::default(), &LinkAnalysis::default());
        // only unverified link health and image coverage of nothing
        assert_eq!(result.score, 10 + IMAGES_WEIGHT);
        assert!(result.issues.iter().any(|i| i == "Page has no <title>"));
        assert!(result.issues.iter().any(|i| i == "Page has no meta description"));
        assert!(result.issues.iter().any(|i| i == "Page has no <h1>"));
    }

    #[test]
    fn test_short_title_gets_half_credit() {
        let mut signals = strong_page();
        signals.title = Some("Mugs".to_string());
        let result = score_page(&signals, &healthy_links());
        assert_eq!(result.score, 100 - TITLE_WEIGHT / 2);
        assert!(result.issues[0].starts_with("Title is 4 characters"));
    }

    #[test]
    fn test_confirmed_broken_links_cost_points() {
        let links = LinkAnalysis {
            confirmed_broken_links_count: 3,
            ..healthy_links()
        };
        let result = score_page(&strong_page(), &links);
        assert_eq!(result.score, 100 - 6);
        assert!(result.issues.iter().any(|i| i == "3 broken link(s) found"));
    }

    #[test]
    fn test_network_issues_are_reported_not_penalized() {
        let links = LinkAnalysis {
            network_issue_links_count: 4,
            ..healthy_links()
        };
        let result = score_page(&strong_page(), &links);
        assert_eq!(result.score, 100);
        assert!(result.issues.iter().any(|i| i.starts_with("4 link(s) could not be reached")));
    }

    #[test]
    fn test_missing_alt_and_skipped_headings() {
        let mut signals = strong_page();
        signals.images = ImageSummary {
            total: 4,
            with_alt: 1,
            missing_alt: 3,
            missing_alt_sources: Vec::new(),
        };
        signals.headings.h4 = vec!["Deep".to_string()];
        signals.headings.sequence = vec![1, 2, 4];

        let result = score_page(&signals, &healthy_links());
        // 15 * 0.25 rounds to 4, skipped headings lose 3
        assert_eq!(result.score, 100 - (15 - 4) - 3);
        assert!(result.issues.iter().any(|i| i == "3 of 4 image(s) are missing alt text"));
    }

    #[test]
    fn test_score_never_exceeds_100() {
        let links = LinkAnalysis {
            confirmed_broken_links_count: 100,
            ..healthy_links()
        };
        let result = score_page(&strong_page(), &links);
        assert!(result.score <= 100);
        assert_eq!(result.score, 90);
    }

    #[test]
    fn test_huge_broken_link_count_does_not_overflow() {
        let links = LinkAnalysis {
            confirmed_broken_links_count: usize::MAX,
            ..healthy_links()
        };
        let result = score_page(&strong_page(), &links);
        assert_eq!(result.score, 90);
    }
}
