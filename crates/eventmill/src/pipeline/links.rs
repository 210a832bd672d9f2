//! Tracker-link expansion for aggregator newsletters.
//!
//! Aggregators route every URL through a click tracker, so the body the
//! model sees is full of opaque redirect links. Before extraction, links on
//! a configured tracker domain are followed to their destination and have
//! their `utm_*` tracking parameters stripped. Resolution is best effort: a
//! link that fails to resolve stays as-is, and resolved targets are
//! memoized so repeated links (and repeated runs over similar bodies) cost
//! one request each.

use futures_util::future::join_all;
use log::debug;
use moka::sync::Cache;
use regex::Regex;
use reqwest::{Client, Url};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use super::error::PipelineError;

// Pre-compiled regex for body URLs, angle-bracket wrapped or bare
static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(https?://[^>\s]+)>|(https?://[^\s<>"')\]]+)"#).unwrap()
});

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);
const MEMO_CAPACITY: u64 = 10_000;

pub struct LinkResolver {
    client: Client,
    memo: Cache<String, String>,
    tracker_domains: Vec<String>,
}

impl LinkResolver {
    pub fn new(tracker_domains: Vec<String>) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(RESOLVE_TIMEOUT)
            .build()
            .map_err(PipelineError::HttpClient)?;
        Ok(Self {
            client,
            memo: Cache::new(MEMO_CAPACITY),
            tracker_domains,
        })
    }

    /// Replaces every tracker-domain URL in `body` with its resolved
    /// destination. Non-tracker URLs and unresolvable links are untouched.
    pub async fn expand_tracked_links(&self, body: &str) -> String {
        let targets: Vec<String> = candidate_urls(body)
            .into_iter()
            .filter(|url| self.is_tracked(url))
            .collect();
        if targets.is_empty() {
            return body.to_string();
        }

        let mut replacements: Vec<(String, String)> = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for url in targets {
            match self.memo.get(&url) {
                Some(known) => replacements.push((url, known)),
                None => pending.push(url),
            }
        }

        let resolved = join_all(pending.iter().map(|url| self.resolve_once(url))).await;
        for (url, target) in pending.into_iter().zip(resolved) {
            self.memo.insert(url.clone(), target.clone());
            replacements.push((url, target));
        }

        apply_replacements(body, replacements)
    }

    fn is_tracked(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.tracker_domains
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")))
    }

    async fn resolve_once(&self, url: &str) -> String {
        match self.client.get(url).send().await {
            Ok(response) => strip_tracking_params(response.url()),
            Err(error) => {
                debug!("keeping unresolved tracker link {url}: {error}");
                url.to_string()
            }
        }
    }
}

/// Unique URLs in body order.
fn candidate_urls(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for caps in RE_URL.captures_iter(body) {
        let Some(found) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let url = found.as_str().to_string();
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
    urls
}

/// Drops `utm_*` query parameters, keeping everything else intact.
fn strip_tracking_params(url: &Url) -> String {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !name.to_lowercase().starts_with("utm_"))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut cleaned = url.clone();
    cleaned.set_query(None);
    if !kept.is_empty() {
        let mut pairs = cleaned.query_pairs_mut();
        for (name, value) in &kept {
            pairs.append_pair(name, value);
        }
    }
    cleaned.to_string()
}

/// Longest source first, so a URL that prefixes another cannot corrupt it.
fn apply_replacements(body: &str, mut replacements: Vec<(String, String)>) -> String {
    replacements.sort_by_key(|(from, _)| std::cmp::Reverse(from.len()));
    let mut text = body.to_string();
    for (from, to) in replacements {
        if from != to {
            text = text.replace(&from, &to);
        }
    }
    text
}
