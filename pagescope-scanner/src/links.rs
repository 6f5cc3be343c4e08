use crate::dedup::unique_targets;
use crate::error::Result;
use crate::reducer::{CategoryCounts, reduce_outcomes};
use crate::resolver::{AnchorReference, BaseOrigin, classify_anchors};
use crate::result::BrokenLinkRecord;
use crate::verifier::LinkVerifier;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Link section of a page analysis, as handed to scoring and serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAnalysis {
    pub internal_links: Vec<String>,
    pub external_dofollow_links: Vec<String>,
    pub external_nofollow_links: Vec<String>,
    pub broken_links: Vec<BrokenLinkRecord>,
    pub confirmed_broken_links_count: usize,
    pub network_issue_links_count: usize,
    pub category_counts: CategoryCounts,
    pub links_verified: bool,
    pub unique_links_checked: usize,
}

impl LinkAnalysis {
    pub fn total_links(&self) -> usize {
        self.internal_links.len()
            + self.external_dofollow_links.len()
            + self.external_nofollow_links.len()
    }
}

/// Resolve and classify every anchor on `page_url`, then, if a verifier is
/// given, check each distinct URL once and reduce the outcomes.
///
/// Only an unusable `page_url` is an error. Individual links that fail to
/// resolve or verify end up dropped or in `broken_links` respectively.
pub async fn analyze_links(
    page_url: &str,
    anchors: &[AnchorReference],
    verifier: Option<&LinkVerifier>,
) -> Result<LinkAnalysis> {
    let base = BaseOrigin::parse(page_url)?;
    let classified = classify_anchors(&base, anchors);
    info!(
        "Classified {} of {} anchor(s) on {}: {} internal, {} external dofollow, {} external nofollow",
        classified.total(),
        anchors.len(),
        page_url,
        classified.internal.len(),
        classified.external_dofollow.len(),
        classified.external_nofollow.len()
    );

    let mut analysis = LinkAnalysis {
        internal_links: classified.internal,
        external_dofollow_links: classified.external_dofollow,
        external_nofollow_links: classified.external_nofollow,
        ..LinkAnalysis::default()
    };

    let Some(verifier) = verifier else {
        return Ok(analysis);
    };

    let targets = unique_targets(classified.resolved.iter().map(|link| &link.absolute_url));
    analysis.unique_links_checked = targets.len();

    let report = reduce_outcomes(verifier.verify_all(targets).await);
    analysis.broken_links = report.broken_links;
    analysis.confirmed_broken_links_count = report.confirmed_broken_links_count;
    analysis.network_issue_links_count = report.network_issue_links_count;
    analysis.category_counts = report.category_counts;
    analysis.links_verified = true;

    Ok(analysis)
}
