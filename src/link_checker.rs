use crate::models::{LinkCheckOutcome, LinkKind, LinkValidation};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use reqwest::header::RANGE;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector should be valid"));
static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[src]").expect("img[src] selector should be valid"));

/// Checks every link and image target on a page for reachability under a
/// bounded worker pool.
pub struct LinkChecker {
    client: reqwest::Client,
    workers: usize,
    delay: Duration,
}

impl LinkChecker {
    pub fn new(client: reqwest::Client, workers: usize, delay: Duration) -> Self {
        Self {
            client,
            workers: workers.max(1),
            delay,
        }
    }

    /// Extracts all hyperlink/image targets from `html`, resolves them
    /// against `base`, and checks the deduplicated set concurrently. Never
    /// fails: unreachable targets become findings, not errors. The order of
    /// the returned broken lists is not stable across runs.
    pub async fn validate_page_links(&self, html: &str, base: &Url) -> LinkValidation {
        let targets = Self::extract_targets(html, base);

        let outcomes: Vec<LinkCheckOutcome> = stream::iter(targets)
            .map(|(url, kind)| self.check_target(url, kind))
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut validation = LinkValidation::default();
        for outcome in outcomes {
            if outcome.reachable {
                continue;
            }
            tracing::info!(
                target = %outcome.url,
                status = ?outcome.status,
                reason = ?outcome.reason,
                "Broken target"
            );
            match outcome.kind {
                LinkKind::Hyperlink => validation.broken_links.push(outcome.url),
                LinkKind::Image => validation.broken_images.push(outcome.url),
            }
        }
        validation.total_broken = validation.broken_links.len() + validation.broken_images.len();
        validation
    }

    /// Collects checkable (url, kind) pairs from the markup. Anchor-only
    /// references and non-fetchable schemes (mailto:, javascript:, tel:,
    /// data:) are excluded rather than reported broken; identical targets
    /// are deduplicated.
    fn extract_targets(html: &str, base: &Url) -> Vec<(Url, LinkKind)> {
        let document = Html::parse_document(html);
        let mut seen: HashSet<(String, LinkKind)> = HashSet::new();
        let mut targets = Vec::new();

        let anchors = document
            .select(&ANCHOR_SELECTOR)
            .filter_map(|el| el.value().attr("href"))
            .map(|raw| (raw, LinkKind::Hyperlink));
        let images = document
            .select(&IMG_SELECTOR)
            .filter_map(|el| el.value().attr("src"))
            .map(|raw| (raw, LinkKind::Image));

        for (raw, kind) in anchors.chain(images) {
            let Some(resolved) = resolve_target(raw, base) else {
                continue;
            };
            if seen.insert((resolved.to_string(), kind)) {
                targets.push((resolved, kind));
            }
        }

        targets
    }

    /// HEAD-first existence check with a partial-GET fallback for hosts that
    /// reject HEAD. Broken = request error or final status >= 400 after
    /// redirects.
    async fn check_target(&self, url: Url, kind: LinkKind) -> LinkCheckOutcome {
        tokio::time::sleep(self.delay).await;

        match self.client.head(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::METHOD_NOT_ALLOWED
                    || status == StatusCode::NOT_IMPLEMENTED
                {
                    return self.check_with_get(url, kind).await;
                }
                LinkCheckOutcome {
                    url: url.to_string(),
                    kind,
                    reachable: status.as_u16() < 400,
                    status: Some(status.as_u16()),
                    reason: None,
                }
            }
            // Some hosts reset HEAD connections outright; give GET a chance.
            Err(_) => self.check_with_get(url, kind).await,
        }
    }

    async fn check_with_get(&self, url: Url, kind: LinkKind) -> LinkCheckOutcome {
        match self
            .client
            .get(url.clone())
            .header(RANGE, "bytes=0-1023")
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                LinkCheckOutcome {
                    url: url.to_string(),
                    kind,
                    reachable: status.as_u16() < 400,
                    status: Some(status.as_u16()),
                    reason: None,
                }
            }
            Err(e) => LinkCheckOutcome {
                url: url.to_string(),
                kind,
                reachable: false,
                status: None,
                reason: Some(e.to_string()),
            },
        }
    }
}

/// Resolves a raw attribute value into an absolute http(s) URL, or `None`
/// for targets that should not be checked.
fn resolve_target(raw: &str, base: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let lowered = raw.to_ascii_lowercase();
    for scheme in ["mailto:", "javascript:", "tel:", "data:"] {
        if lowered.starts_with(scheme) {
            return None;
        }
    }
    let resolved = base.join(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
