pub mod dedup;
pub mod error;
pub mod links;
pub mod reducer;
pub mod resolver;
pub mod result;
pub mod verifier;

pub use dedup::unique_targets;
pub use error::ScanError;
pub use links::{LinkAnalysis, analyze_links};
pub use reducer::{CategoryCounts, LinkReport, reduce_outcomes};
pub use resolver::{
    AnchorReference, BaseOrigin, ClassifiedLinks, FollowPolicy, LinkClass, ResolvedLink,
    classify_anchors, resolve_anchor,
};
pub use result::{BrokenLinkRecord, LinkCategory, LinkStatus, VerificationOutcome};
pub use verifier::{LinkVerifier, VerifierConfig};
