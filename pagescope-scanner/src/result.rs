use serde::{Deserialize, Serialize};
use std::fmt;

pub const TIMEOUT_LABEL: &str = "Timeout";
pub const DNS_FAILURE_LABEL: &str = "DNS Resolution Failed";
pub const CONNECTION_REFUSED_LABEL: &str = "Connection Refused";
pub const GENERIC_NETWORK_LABEL: &str = "Generic Network Error";
pub const TOO_MANY_REDIRECTS_LABEL: &str = "Too Many Redirects";

/// Closed taxonomy every verification settles into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkCategory {
    Reachable,
    ClientError,
    ServerError,
    NetworkIssue,
    RequestSetupError,
    UnknownError,
}

impl LinkCategory {
    pub fn is_broken(self) -> bool {
        self != LinkCategory::Reachable
    }

    /// 4xx and 5xx: the server answered and said no.
    pub fn is_confirmed_broken(self) -> bool {
        matches!(self, LinkCategory::ClientError | LinkCategory::ServerError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkCategory::Reachable => "Reachable",
            LinkCategory::ClientError => "ClientError",
            LinkCategory::ServerError => "ServerError",
            LinkCategory::NetworkIssue => "NetworkIssue",
            LinkCategory::RequestSetupError => "RequestSetupError",
            LinkCategory::UnknownError => "UnknownError",
        }
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either the HTTP status code that came back, or a label describing why
/// nothing came back. Serializes as a bare number or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkStatus {
    Code(u16),
    Label(String),
}

impl LinkStatus {
    pub fn label(label: impl Into<String>) -> Self {
        LinkStatus::Label(label.into())
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            LinkStatus::Code(code) => Some(*code),
            LinkStatus::Label(_) => None,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Code(code) => write!(f, "{}", code),
            LinkStatus::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub url: String,
    pub status: LinkStatus,
    pub category: LinkCategory,
}

impl VerificationOutcome {
    pub fn new(url: String, status: LinkStatus, category: LinkCategory) -> Self {
        Self {
            url,
            status,
            category,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.category.is_broken()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLinkRecord {
    pub url: String,
    pub status: LinkStatus,
    pub category: LinkCategory,
}

impl BrokenLinkRecord {
    /// Returns `None` for reachable outcomes; those never become records.
    pub fn from_outcome(outcome: VerificationOutcome) -> Option<Self> {
        if !outcome.is_broken() {
            return None;
        }
        Some(Self {
            url: outcome.url,
            status: outcome.status,
            category: outcome.category,
        })
    }
}
