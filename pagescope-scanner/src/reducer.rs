use crate::result::{BrokenLinkRecord, LinkCategory, VerificationOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub reachable: usize,
    pub client_error: usize,
    pub server_error: usize,
    pub network_issue: usize,
    pub request_setup_error: usize,
    pub unknown_error: usize,
}

impl CategoryCounts {
    pub fn record(&mut self, category: LinkCategory) {
        match category {
            LinkCategory::Reachable => self.reachable += 1,
            LinkCategory::ClientError => self.client_error += 1,
            LinkCategory::ServerError => self.server_error += 1,
            LinkCategory::NetworkIssue => self.network_issue += 1,
            LinkCategory::RequestSetupError => self.request_setup_error += 1,
            LinkCategory::UnknownError => self.unknown_error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.reachable
            + self.client_error
            + self.server_error
            + self.network_issue
            + self.request_setup_error
            + self.unknown_error
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    pub broken_links: Vec<BrokenLinkRecord>,
    /// ClientError + ServerError
    pub confirmed_broken_links_count: usize,
    /// NetworkIssue only
    pub network_issue_links_count: usize,
    pub category_counts: CategoryCounts,
}

/// Drops reachable outcomes, keeps the rest in input order and tallies them.
pub fn reduce_outcomes(outcomes: Vec<VerificationOutcome>) -> LinkReport {
    let mut report = LinkReport::default();

    for outcome in outcomes {
        let category = outcome.category;
        report.category_counts.record(category);

        if category.is_confirmed_broken() {
            report.confirmed_broken_links_count += 1;
        } else if category == LinkCategory::NetworkIssue {
            report.network_issue_links_count += 1;
        }

        if let Some(record) = BrokenLinkRecord::from_outcome(outcome) {
            report.broken_links.push(record);
        }
    }

    report
}
