// Single-page analysis: fetch, extract, verify links, suggest keywords, score

use crate::config::Settings;
use crate::error::Result;
use crate::extract::{Headings, ImageSummary, StructuredData, extract_signals};
use crate::fetch::PageFetcher;
use crate::keywords::KeywordClient;
use crate::scoring::{SeoScore, score_page};
use chrono::{SecondsFormat, Utc};
use pagescope_scanner::{LinkAnalysis, LinkVerifier, analyze_links};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub url: String,
    #[serde(default = "default_true")]
    pub check_links: bool,
    #[serde(default)]
    pub suggest_keywords: bool,
}

impl AnalyzeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            check_links: true,
            suggest_keywords: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub url: String,
    pub final_url: String,
    /// RFC 3339, UTC.
    pub analyzed_at: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
    pub lang: Option<String>,
    pub has_viewport: bool,
    pub word_count: usize,
    pub headings: Headings,
    pub images: ImageSummary,
    pub structured_data: StructuredData,
    #[serde(flatten)]
    pub links: LinkAnalysis,
    pub keywords: Vec<String>,
    pub keyword_error: Option<String>,
    #[serde(flatten)]
    pub score: SeoScore,
}

/// Owns the HTTP clients for one process. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Analyzer {
    fetcher: PageFetcher,
    verifier: LinkVerifier,
    keywords: KeywordClient,
}

impl Analyzer {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(settings.fetch.clone())?,
            verifier: LinkVerifier::new(settings.verifier.clone())?,
            keywords: KeywordClient::new(settings.keywords.clone())?,
        })
    }

    /// Assemble an analyzer from prebuilt parts, e.g. a keyword client with
    /// an explicit key.
    pub fn from_parts(
        fetcher: PageFetcher,
        verifier: LinkVerifier,
        keywords: KeywordClient,
    ) -> Self {
        Self {
            fetcher,
            verifier,
            keywords,
        }
    }

    /// Only fetching the page itself can fail. Link and keyword problems are
    /// reported inside the returned analysis.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<PageAnalysis> {
        info!(
            "Analyzing {} (links: {}, keywords: {})",
            request.url, request.check_links, request.suggest_keywords
        );

        let page = self.fetcher.fetch(&request.url).await?;
        let signals = extract_signals(&page.html);

        let verifier = request.check_links.then_some(&self.verifier);
        let links = analyze_links(&page.final_url, &signals.anchors, verifier).await?;

        let (keywords, keyword_error) = if request.suggest_keywords {
            match self.keywords.suggest(&signals).await {
                Ok(keywords) => (keywords, None),
                Err(e) => {
                    warn!("Keyword suggestion failed: {}", e);
                    (Vec::new(), Some(e.to_string()))
                }
            }
        } else {
            (Vec::new(), None)
        };

        let score = score_page(&signals, &links);
        info!(
            "Scored {} at {} with {} broken link(s)",
            page.final_url,
            score.score,
            links.broken_links.len()
        );

        Ok(PageAnalysis {
            url: request.url.clone(),
            final_url: page.final_url,
            analyzed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            title: signals.title,
            meta_description: signals.meta_description,
            canonical: signals.canonical,
            lang: signals.lang,
            has_viewport: signals.has_viewport,
            word_count: signals.word_count,
            headings: signals.headings,
            images: signals.images,
            structured_data: signals.structured_data,
            links,
            keywords,
            keyword_error,
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchSettings, KeywordSettings};
    use crate::error::AnalyzeError;
    use pagescope_scanner::{LinkCategory, LinkStatus, VerifierConfig};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn analyzer(keyword_endpoint: Option<String>, api_key: Option<&str>) -> Analyzer {
        let keyword_settings = KeywordSettings {
            endpoint: keyword_endpoint.unwrap_or_else(|| KeywordSettings::default().endpoint),
            timeout_secs: 2,
            ..KeywordSettings::default()
        };
        Analyzer::from_parts(
            PageFetcher::new(FetchSettings::default()).unwrap(),
            LinkVerifier::new(VerifierConfig {
                timeout_secs: 2,
                ..VerifierConfig::default()
            })
            .unwrap(),
            KeywordClient::with_api_key(keyword_settings, api_key.map(str::to_string)).unwrap(),
        )
    }

    async fn site() -> MockServer {
        let mock_server = MockServer::start().await;
        let html = r#"<html lang="en"><head>
            <title>Ceramic Mugs</title>
            <meta name="description" content="Hand thrown mugs.">
            </head><body>
            <h1>Mugs</h1>
            <a href="/about">About</a>
            <a href="/gone">Old page</a>
            <a href="/about">About again</a>
            </body></html>"#;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_analyze_page_with_links() {
        let mock_server = site().await;
        let request = AnalyzeRequest::new(format!("{}/", mock_server.uri()));

        let analysis = analyzer(None, None).analyze(&request).await.unwrap();

        assert_eq!(analysis.title.as_deref(), Some("Ceramic Mugs"));
        assert_eq!(analysis.links.internal_links.len(), 3);
        assert_eq!(analysis.links.unique_links_checked, 2);
        assert_eq!(analysis.links.broken_links.len(), 1);
        assert_eq!(analysis.links.broken_links[0].status, LinkStatus::Code(410));
        assert_eq!(analysis.links.broken_links[0].category, LinkCategory::ClientError);
        assert!(analysis.keywords.is_empty());
        assert!(analysis.keyword_error.is_none());
        assert!(analysis.score.score <= 100);
    }

    #[tokio::test]
    async fn test_analyze_without_link_check() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/x">x</a>"#))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/x"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let request = AnalyzeRequest {
            check_links: false,
            ..AnalyzeRequest::new(mock_server.uri())
        };
        let analysis = analyzer(None, None).analyze(&request).await.unwrap();

        assert!(!analysis.links.links_verified);
        assert_eq!(analysis.links.internal_links.len(), 1);
        assert!(analysis.links.broken_links.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_failure_does_not_abort() {
        let mock_server = site().await;
        let request = AnalyzeRequest {
            suggest_keywords: true,
            ..AnalyzeRequest::new(mock_server.uri())
        };

        let analysis = analyzer(None, None).analyze(&request).await.unwrap();

        assert!(analysis.keywords.is_empty());
        assert!(analysis.keyword_error.unwrap().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_keywords_included() {
        let mock_server = site().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "mugs, pottery"}}]
            })))
            .mount(&mock_server)
            .await;

        let request = AnalyzeRequest {
            suggest_keywords: true,
            ..AnalyzeRequest::new(mock_server.uri())
        };
        let endpoint = format!("{}/v1/chat/completions", mock_server.uri());
        let analysis = analyzer(Some(endpoint), Some("k")).analyze(&request).await.unwrap();

        assert_eq!(analysis.keywords, vec!["mugs", "pottery"]);
        assert!(analysis.keyword_error.is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let result = analyzer(None, None).analyze(&AnalyzeRequest::new("not-a-url")).await;
        assert!(matches!(result, Err(AnalyzeError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_response_shape() {
        let mock_server = site().await;
        let analysis = analyzer(None, None)
            .analyze(&AnalyzeRequest::new(mock_server.uri()))
            .await
            .unwrap();

        let json = serde_json::to_value(&analysis).unwrap();
        for key in [
            "url",
            "finalUrl",
            "analyzedAt",
            "title",
            "metaDescription",
            "headings",
            "images",
            "structuredData",
            "internalLinks",
            "externalDofollowLinks",
            "externalNofollowLinks",
            "brokenLinks",
            "confirmedBrokenLinksCount",
            "networkIssueLinksCount",
            "keywords",
            "keywordError",
            "score",
            "strengths",
            "issues",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["brokenLinks"][0]["status"], 410);
        assert_eq!(json["brokenLinks"][0]["category"], "ClientError");
    }

    #[test]
    fn test_request_defaults() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"url": "https://example.com"}"#).unwrap();
        assert!(request.check_links);
        assert!(!request.suggest_keywords);

        let body = r#"{"url": "https://example.com", "checkLinks": false, "suggestKeywords": true}"#;
        let request: AnalyzeRequest = serde_json::from_str(body).unwrap();
        assert!(!request.check_links);
        assert!(request.suggest_keywords);
    }
}
