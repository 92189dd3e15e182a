//! DuckDuckGo search over the no-JavaScript HTML endpoint (no API key).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::SearchClient;
use crate::error::{MarketError, Result};
use crate::model::SearchHit;

pub const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com/html/";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub struct DuckDuckGoClient {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl SearchClient for DuckDuckGoClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        tracing::debug!(query, max_results, "DuckDuckGo search");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        let html = response.text().await?;

        if !status.is_success() {
            return Err(MarketError::Status {
                service: "DuckDuckGo",
                status: status.as_u16(),
                body: strip_tags(&html).chars().take(200).collect(),
            });
        }

        Ok(extract_results(&html, max_results))
    }

    fn name(&self) -> &str {
        "DuckDuckGo"
    }
}

/// Pull title, target URL and snippet out of each `result__body` block.
/// Sponsored blocks and blocks without a usable title or URL are skipped.
fn extract_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let pieces: Vec<&str> = html.split("result__body").collect();
    pieces
        .windows(2)
        .filter(|pair| !is_sponsored(pair[0]))
        .filter_map(|pair| parse_result(pair[1]))
        .take(max_results)
        .collect()
}

/// Whether the `result` wrapper opened at the end of `preceding` is an ad
fn is_sponsored(preceding: &str) -> bool {
    preceding.rfind("class=\"result ").is_some_and(|start| {
        preceding[start..]
            .split('"')
            .nth(1)
            .is_some_and(|class| class.split_whitespace().any(|c| c.starts_with("result--ad")))
    })
}

fn parse_result(chunk: &str) -> Option<SearchHit> {
    let anchor = chunk.split("class=\"result__a\"").nth(1)?;
    let title = element_text(anchor)?;

    let url = attribute(anchor, "href")
        .and_then(resolve_link)
        .or_else(|| {
            chunk
                .split("class=\"result__url\"")
                .nth(1)
                .and_then(element_text)
                .map(|display| format!("https://{}", display.trim_start_matches("https://")))
        })?;

    let snippet = chunk
        .split("class=\"result__snippet\"")
        .nth(1)
        .and_then(element_text)
        .unwrap_or_default();

    Some(SearchHit { title, url, snippet })
}

/// Text between the end of the opening tag and the matching close tag
fn element_text(after_class: &str) -> Option<String> {
    let (_, rest) = after_class.split_once('>')?;
    let end = ["</a>", "</td>", "</div>", "</span>"]
        .iter()
        .filter_map(|tag| rest.find(tag))
        .min()
        .unwrap_or(rest.len());

    let text = html_decode(strip_tags(&rest[..end]).trim());
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Value of `name="..."` inside the current tag
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let tag = tag.split('>').next()?;
    let start = tag.find(&format!("{name}=\""))? + name.len() + 2;
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

/// DuckDuckGo wraps targets as `//duckduckgo.com/l/?uddg=<encoded>`
fn resolve_link(href: &str) -> Option<String> {
    let href = html_decode(href);
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href
    };

    let url = Url::parse(&absolute).ok()?;
    if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
        return Some(target.into_owned());
    }
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
