use std::sync::Arc;

use crate::config::{SearchBackend, SearchSettings};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Web search returning text snippets for a query, best match first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

/// Builds the configured search backend.
pub fn search_provider(settings: &SearchSettings) -> Result<Arc<dyn SearchProvider>> {
    let provider: Arc<dyn SearchProvider> = match settings.backend {
        SearchBackend::Brave => Arc::new(BraveSearch::new(settings)?),
        SearchBackend::DuckDuckGo => Arc::new(DuckDuckGoSearch::new(settings)?),
    };
    tracing::info!(backend = settings.backend.as_str(), "Search provider ready");
    Ok(provider)
}

fn http_client(settings: &SearchSettings) -> Result<Client> {
    Ok(Client::builder()
        .timeout(settings.timeout)
        .user_agent(concat!("quiz-generator/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Client for the Brave Search web results API.
#[derive(Clone)]
pub struct BraveSearch {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BraveResponse {
    web: BraveWeb,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BraveWeb {
    results: Vec<BraveResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BraveResult {
    title: String,
    url: String,
    description: String,
    extra_snippets: Vec<String>,
}

impl BraveSearch {
    pub fn new(settings: &SearchSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("SEARCH_API_KEY is required for Brave search".to_string()))?;
        Ok(Self {
            client: http_client(settings)?,
            base_url: settings.base_url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        tracing::info!("Searching for: {}", query);
        let count = limit.clamp(1, 20).to_string();
        let res = self
            .client
            .get(format!("{}/web/search", self.base_url))
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("Search API Error {}: {}", status, text)));
        }

        let body: BraveResponse = res.json().await?;
        let mut hits: Vec<SearchHit> = body
            .web
            .results
            .into_iter()
            .filter_map(|r| {
                let mut snippet = strip_markup(&r.description);
                for extra in &r.extra_snippets {
                    let extra = strip_markup(extra);
                    if !extra.is_empty() {
                        snippet.push(' ');
                        snippet.push_str(&extra);
                    }
                }
                let snippet = snippet.trim().to_string();
                (!snippet.is_empty()).then(|| SearchHit {
                    title: strip_markup(&r.title),
                    snippet,
                    url: r.url,
                })
            })
            .collect();
        hits.truncate(limit);
        tracing::debug!(count = hits.len(), "Search returned snippets");
        Ok(hits)
    }
}

/// Drops inline tags such as `<strong>` and decodes the common entities
/// result descriptions carry.
fn strip_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Client for the DuckDuckGo Instant Answer API. Needs no key but only
/// answers topic-style queries.
#[derive(Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    definition: String,
    #[serde(rename = "DefinitionURL")]
    definition_url: String,
    results: Vec<Topic>,
    related_topics: Vec<Topic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Topic {
    text: String,
    #[serde(rename = "FirstURL")]
    first_url: String,
    name: String,
    topics: Vec<Topic>,
}

impl DuckDuckGoSearch {
    pub fn new(settings: &SearchSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(settings)?,
            base_url: settings.base_url.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        tracing::info!("Searching for: {}", query);
        let res = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(Error::Provider(format!(
                "Search API Error {}",
                res.status()
            )));
        }

        // The API answers with a javascript content type, so parse by hand.
        let text = res.text().await?;
        let answer: InstantAnswer = serde_json::from_str(&text)
            .map_err(|e| Error::Provider(format!("Invalid search response: {}", e)))?;

        let mut hits = answer.into_hits();
        hits.truncate(limit);
        tracing::debug!(count = hits.len(), "Search returned snippets");
        Ok(hits)
    }
}

impl InstantAnswer {
    fn into_hits(self) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        if !self.abstract_text.trim().is_empty() {
            hits.push(SearchHit {
                title: self.heading.clone(),
                snippet: self.abstract_text.trim().to_string(),
                url: self.abstract_url,
            });
        }
        if !self.definition.trim().is_empty() {
            hits.push(SearchHit {
                title: self.heading,
                snippet: self.definition.trim().to_string(),
                url: self.definition_url,
            });
        }
        for topic in self.results.into_iter().chain(self.related_topics) {
            topic.flatten_into(&mut hits);
        }
        hits
    }
}

impl Topic {
    fn flatten_into(self, hits: &mut Vec<SearchHit>) {
        if !self.topics.is_empty() {
            for t in self.topics {
                t.flatten_into(hits);
            }
            return;
        }
        let snippet = self.text.trim();
        if snippet.is_empty() {
            return;
        }
        let title = snippet
            .split(" - ")
            .next()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.name)
            .to_string();
        hits.push(SearchHit {
            title,
            snippet: snippet.to_string(),
            url: self.first_url,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String) -> SearchSettings {
        SearchSettings {
            backend: SearchBackend::DuckDuckGo,
            api_key: None,
            base_url,
            timeout: Duration::from_secs(5),
            max_snippets: 5,
        }
    }

    fn brave_settings(base_url: String) -> SearchSettings {
        SearchSettings {
            backend: SearchBackend::Brave,
            api_key: Some("brave-key".to_string()),
            ..settings(base_url)
        }
    }

    #[tokio::test]
    async fn brave_results_become_clean_snippets() {
        let server = MockServer::start().await;
        let body = json!({
            "type": "search",
            "query": { "original": "total mass closed chemical reaction" },
            "web": {
                "type": "search",
                "results": [
                    {
                        "title": "Conservation of <strong>mass</strong> - Wikipedia",
                        "url": "https://en.wikipedia.org/wiki/Conservation_of_mass",
                        "description": "In a closed system the <strong>mass</strong> of the reactants equals the mass of the products.",
                        "extra_snippets": ["Antoine Lavoisier&#x27;s experiments established the law."],
                        "language": "en",
                        "family_friendly": true
                    },
                    {
                        "title": "Empty result",
                        "url": "https://example.org/empty",
                        "description": ""
                    },
                    {
                        "title": "Law of conservation of mass | Britannica",
                        "url": "https://www.britannica.com/science/law-of-conservation-of-mass",
                        "description": "Mass is neither created nor destroyed in chemical reactions."
                    }
                ]
            }
        });
        Mock::given(method("GET"))
            .and(path("/web/search"))
            .and(header("X-Subscription-Token", "brave-key"))
            .and(query_param("q", "total mass closed chemical reaction"))
            .and(query_param("count", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let search = BraveSearch::new(&brave_settings(server.uri())).unwrap();
        let hits = search
            .search("total mass closed chemical reaction", 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Conservation of mass - Wikipedia");
        assert_eq!(
            hits[0].snippet,
            "In a closed system the mass of the reactants equals the mass of the products. \
             Antoine Lavoisier's experiments established the law."
        );
        assert_eq!(hits[1].url, "https://www.britannica.com/science/law-of-conservation-of-mass");
    }

    #[tokio::test]
    async fn brave_rejection_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let search = BraveSearch::new(&brave_settings(server.uri())).unwrap();
        let err = search.search("anything", 5).await.unwrap_err();
        assert!(matches!(err, Error::Provider(msg) if msg.contains("429")));
    }

    #[test]
    fn brave_requires_a_key() {
        let mut s = brave_settings("http://localhost".to_string());
        s.api_key = None;
        assert!(matches!(BraveSearch::new(&s), Err(Error::Config(_))));
    }

    #[test]
    fn markup_is_stripped() {
        assert_eq!(strip_markup(" <b>A</b> &amp; B&quot; "), "A & B\"");
    }

    #[tokio::test]
    async fn collects_abstract_and_nested_topics() {
        let server = MockServer::start().await;
        let body = json!({
            "Heading": "Conservation of mass",
            "AbstractText": "The law of conservation of mass states that mass is neither created nor destroyed.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Conservation_of_mass",
            "Definition": "",
            "DefinitionURL": "",
            "Results": [],
            "RelatedTopics": [
                {"Text": "Chemical equation - A symbolic representation of a reaction.", "FirstURL": "https://duckduckgo.com/Chemical_equation"},
                {"Name": "See also", "Topics": [
                    {"Text": "Stoichiometry - Relative quantities of reactants.", "FirstURL": "https://duckduckgo.com/Stoichiometry"}
                ]}
            ]
        });
        Mock::given(method("GET"))
            .and(query_param("q", "conservation of mass"))
            .and(query_param("format", "json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body.to_string(), "application/x-javascript"),
            )
            .mount(&server)
            .await;

        let search = DuckDuckGoSearch::new(&settings(server.uri())).unwrap();
        let hits = search.search("conservation of mass", 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].url, "https://en.wikipedia.org/wiki/Conservation_of_mass");
        assert_eq!(hits[1].title, "Chemical equation");
        assert_eq!(hits[2].title, "Stoichiometry");

        let limited = search.search("conservation of mass", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn empty_answer_yields_no_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Heading": ""})))
            .mount(&server)
            .await;

        let search = DuckDuckGoSearch::new(&settings(server.uri())).unwrap();
        assert!(search.search("nothing", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let search = DuckDuckGoSearch::new(&settings(server.uri())).unwrap();
        let err = search.search("anything", 5).await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}
