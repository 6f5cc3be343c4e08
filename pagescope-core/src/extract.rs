//! SEO signal extraction from a parsed HTML document.
//!
//! Everything here is a pure function of the markup: no network access, no
//! URL resolution. Anchors are handed over raw so the scanner can resolve
//! them against the page's final URL.

use pagescope_scanner::AnchorReference;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_NAMED: LazyLock<Selector> = LazyLock::new(|| selector("meta[name]"));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector("link[rel~=\"canonical\"][href]"));
static HTML_ROOT: LazyLock<Selector> = LazyLock::new(|| selector("html"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));
static IMAGES: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| selector("script[type=\"application/ld+json\"]"));
static MICRODATA: LazyLock<Selector> = LazyLock::new(|| selector("[itemscope][itemtype]"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// Headings by level, texts in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Headings {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    pub h4: Vec<String>,
    pub h5: Vec<String>,
    pub h6: Vec<String>,
    /// Level of every heading as it appears, e.g. `[1, 2, 3, 2]`.
    #[serde(skip)]
    pub sequence: Vec<u8>,
}

impl Headings {
    fn push(&mut self, level: u8, text: String) {
        let bucket = match level {
            1 => &mut self.h1,
            2 => &mut self.h2,
            3 => &mut self.h3,
            4 => &mut self.h4,
            5 => &mut self.h5,
            _ => &mut self.h6,
        };
        bucket.push(text);
        self.sequence.push(level);
    }

    pub fn total(&self) -> usize {
        self.sequence.len()
    }

    /// True when a heading jumps more than one level deeper than the one
    /// before it (an `h2` followed directly by an `h4`).
    pub fn skips_levels(&self) -> bool {
        self.sequence.windows(2).any(|pair| pair[1] > pair[0] + 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub total: usize,
    pub with_alt: usize,
    pub missing_alt: usize,
    pub missing_alt_sources: Vec<String>,
}

impl ImageSummary {
    /// Share of images carrying alt text, 1.0 for pages without images.
    pub fn alt_coverage(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.with_alt as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredData {
    pub json_ld_types: Vec<String>,
    pub microdata_types: Vec<String>,
    pub json_ld_blocks: usize,
    pub invalid_json_ld_blocks: usize,
}

impl StructuredData {
    pub fn is_present(&self) -> bool {
        !self.json_ld_types.is_empty() || !self.microdata_types.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSignals {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
    pub lang: Option<String>,
    pub has_viewport: bool,
    pub headings: Headings,
    pub images: ImageSummary,
    pub structured_data: StructuredData,
    pub word_count: usize,
    #[serde(skip)]
    pub anchors: Vec<AnchorReference>,
}

pub fn extract_signals(html: &str) -> PageSignals {
    let document = Html::parse_document(html);

    let signals = PageSignals {
        title: document.select(&TITLE).next().and_then(|el| non_empty(element_text(el))),
        meta_description: meta_content(&document, "description"),
        canonical: document
            .select(&CANONICAL)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| non_empty(href.trim().to_string())),
        lang: document
            .select(&HTML_ROOT)
            .next()
            .and_then(|el| el.value().attr("lang"))
            .and_then(|lang| non_empty(lang.trim().to_string())),
        has_viewport: meta_content(&document, "viewport").is_some(),
        headings: extract_headings(&document),
        images: extract_images(&document),
        structured_data: extract_structured_data(&document),
        word_count: visible_word_count(&document),
        anchors: extract_anchors(&document),
    };

    debug!(
        "Extracted {} heading(s), {} image(s), {} anchor(s), {} word(s)",
        signals.headings.total(),
        signals.images.total,
        signals.anchors.len(),
        signals.word_count
    );
    signals
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    document
        .select(&META_NAMED)
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .and_then(|el| el.value().attr("content"))
        .and_then(|content| non_empty(collapse_whitespace(content)))
}

fn extract_headings(document: &Html) -> Headings {
    let mut headings = Headings::default();
    for element in document.select(&HEADINGS) {
        let level = element.value().name()[1..].parse::<u8>().unwrap_or(6);
        headings.push(level, element_text(element));
    }
    headings
}

fn extract_images(document: &Html) -> ImageSummary {
    let mut images = ImageSummary::default();
    for element in document.select(&IMAGES) {
        images.total += 1;
        let has_alt = element
            .value()
            .attr("alt")
            .is_some_and(|alt| !alt.trim().is_empty());
        if has_alt {
            images.with_alt += 1;
        } else {
            images.missing_alt += 1;
            if let Some(src) = element.value().attr("src") {
                images.missing_alt_sources.push(src.to_string());
            }
        }
    }
    images
}

fn extract_anchors(document: &Html) -> Vec<AnchorReference> {
    document
        .select(&ANCHORS)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let rel = element.value().attr("rel").unwrap_or("");
            Some(AnchorReference::new(href, rel))
        })
        .collect()
}

fn extract_structured_data(document: &Html) -> StructuredData {
    let mut data = StructuredData::default();

    for script in document.select(&JSON_LD) {
        data.json_ld_blocks += 1;
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => collect_json_ld_types(&value, &mut data.json_ld_types),
            Err(e) => {
                debug!("Skipping invalid JSON-LD block: {}", e);
                data.invalid_json_ld_blocks += 1;
            }
        }
    }

    for element in document.select(&MICRODATA) {
        if let Some(itemtype) = element.value().attr("itemtype") {
            for ty in itemtype.split_whitespace() {
                let name = ty.trim_end_matches('/').rsplit('/').next().unwrap_or(ty);
                push_unique(&mut data.microdata_types, name);
            }
        }
    }

    data
}

fn collect_json_ld_types(value: &Value, types: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_json_ld_types(item, types);
            }
        }
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(ty)) => push_unique(types, ty),
                Some(Value::Array(tys)) => {
                    for ty in tys.iter().filter_map(Value::as_str) {
                        push_unique(types, ty);
                    }
                }
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_json_ld_types(graph, types);
            }
        }
        _ => {}
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

fn visible_word_count(document: &Html) -> usize {
    let root = match document.select(&BODY).next() {
        Some(body) => body,
        None => document.root_element(),
    };

    root.descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor.value().as_element().is_some_and(|el| {
                    matches!(el.name(), "script" | "style" | "noscript" | "template")
                })
            })
        })
        .map(|(_, text)| text.split_whitespace().count())
        .sum()
}
