use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// `rel` tokens that tell crawlers not to pass endorsement through a link.
const UNFOLLOWED_MARKERS: [&str; 3] = ["nofollow", "ugc", "sponsored"];

/// One `<a>` tag as handed over by the HTML extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReference {
    pub raw_href: String,
    pub rel: String,
}

impl AnchorReference {
    pub fn new(raw_href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            raw_href: raw_href.into(),
            rel: rel.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowPolicy {
    Followable,
    Unfollowed,
}

impl FollowPolicy {
    /// Substring match, case-sensitive, on the raw attribute value.
    pub fn from_rel(rel: &str) -> Self {
        if UNFOLLOWED_MARKERS.iter().any(|marker| rel.contains(marker)) {
            FollowPolicy::Unfollowed
        } else {
            FollowPolicy::Followable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkClass {
    Internal,
    ExternalFollowable,
    ExternalUnfollowed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLink {
    pub absolute_url: String,
    pub origin_matches_base: bool,
    pub follow_policy: FollowPolicy,
}

impl ResolvedLink {
    pub fn class(&self) -> LinkClass {
        match (self.origin_matches_base, self.follow_policy) {
            (true, _) => LinkClass::Internal,
            (false, FollowPolicy::Followable) => LinkClass::ExternalFollowable,
            (false, FollowPolicy::Unfollowed) => LinkClass::ExternalUnfollowed,
        }
    }
}

/// The page under analysis. Relative hrefs are joined against the full URL,
/// origin comparisons only look at scheme and host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseOrigin {
    url: Url,
}

impl BaseOrigin {
    pub fn parse(page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", page_url, e)))?;
        Self::from_url(url)
    }

    pub fn from_url(url: Url) -> Result<Self> {
        if url.host_str().is_none() {
            return Err(ScanError::InvalidUrl(format!("{} has no host", url)));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Ports are deliberately not compared: `http://example.com:8080` and
    /// `http://example.com` share an origin here.
    pub fn matches(&self, other: &Url) -> bool {
        other.scheme() == self.scheme() && other.host_str() == self.host()
    }
}

/// Resolve one anchor. Returns `None` when the href cannot be turned into an
/// absolute URL; such anchors never reach the link lists or the verifier.
pub fn resolve_anchor(base: &BaseOrigin, raw_href: &str, rel: &str) -> Option<ResolvedLink> {
    let resolved = match base.url().join(raw_href) {
        Ok(url) => url,
        Err(e) => {
            warn!("Dropping unresolvable href {:?} on {}: {}", raw_href, base.url(), e);
            return None;
        }
    };

    let link = ResolvedLink {
        origin_matches_base: base.matches(&resolved),
        follow_policy: FollowPolicy::from_rel(rel),
        absolute_url: resolved.to_string(),
    };
    debug!("Resolved {:?} -> {} ({:?})", raw_href, link.absolute_url, link.class());
    Some(link)
}

/// Link lists as reported to the caller. Duplicates are kept in document
/// order; only the verification population is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedLinks {
    pub internal: Vec<String>,
    pub external_dofollow: Vec<String>,
    pub external_nofollow: Vec<String>,
    pub resolved: Vec<ResolvedLink>,
}

impl ClassifiedLinks {
    pub fn push(&mut self, link: ResolvedLink) {
        let url = link.absolute_url.clone();
        match link.class() {
            LinkClass::Internal => self.internal.push(url),
            LinkClass::ExternalFollowable => self.external_dofollow.push(url),
            LinkClass::ExternalUnfollowed => self.external_nofollow.push(url),
        }
        self.resolved.push(link);
    }

    pub fn total(&self) -> usize {
        self.resolved.len()
    }
}

pub fn classify_anchors(base: &BaseOrigin, anchors: &[AnchorReference]) -> ClassifiedLinks {
    let mut classified = ClassifiedLinks::default();
    for anchor in anchors {
        if let Some(link) = resolve_anchor(base, &anchor.raw_href, &anchor.rel) {
            classified.push(link);
        }
    }
    classified
}
