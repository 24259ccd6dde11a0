use crate::models::{PageResult, PageStatus};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;

// Cached selectors to avoid repeated parsing and eliminate unwrap() calls
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector should be valid"));
static META_DESC_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name='description']").expect("meta description selector should be valid")
});
static META_ROBOTS_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name='robots']").expect("meta robots selector should be valid")
});
static CANONICAL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("link[rel='canonical']").expect("canonical selector should be valid")
});
static H1_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("h1 selector should be valid"));
static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[src]").expect("img[src] selector should be valid"));

/// Fetches one page at a time and extracts its SEO attributes.
pub struct PageAnalyzer {
    client: reqwest::Client,
    delay: Duration,
}

impl PageAnalyzer {
    pub fn new(client: reqwest::Client, delay: Duration) -> Self {
        Self { client, delay }
    }

    /// Fetches and analyzes a single page. Never propagates a failure: a
    /// fetch or HTTP error yields an error-status PageResult and the
    /// pipeline moves on. A fixed delay precedes every request.
    pub async fn scrape(&self, url: &str) -> PageResult {
        tokio::time::sleep(self.delay).await;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Page fetch failed");
                return PageResult::failed(url, e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Page returned error status");
            return PageResult::failed(url, format!("HTTP {}", status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return PageResult::failed(url, e.to_string()),
        };

        Self::extract(url, &body)
    }

    /// Re-fetches the raw HTML for a URL the analysis stage already fetched
    /// successfully. Used by the link-validation stage; the re-fetch (rather
    /// than a response cache) is a deliberate design decision.
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        tokio::time::sleep(self.delay).await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to re-fetch {}", url))?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    fn extract(url: &str, body: &str) -> PageResult {
        let document = Html::parse_document(body);
        let mut result = PageResult::new(url);

        result.title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty());

        result.meta_description = document
            .select(&META_DESC_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .filter(|d| !d.is_empty());

        result.meta_robots = document
            .select(&META_ROBOTS_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.to_string());

        result.canonical = document
            .select(&CANONICAL_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|s| s.to_string());

        result.h1_tags = document
            .select(&H1_SELECTOR)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect();

        for img in document.select(&IMG_SELECTOR) {
            result.image_count += 1;
            let alt = img.value().attr("alt").unwrap_or("");
            if alt.trim().is_empty() {
                result.images_missing_alt += 1;
            }
        }

        Self::check_on_page_findings(&mut result);
        result
    }

    fn check_on_page_findings(result: &mut PageResult) {
        let mut findings = Vec::new();

        if result.title.is_none() {
            findings.push("Missing title tag".to_string());
        }
        if result.meta_description.is_none() {
            findings.push("Missing meta description".to_string());
        }
        if result.h1_tags.is_empty() {
            findings.push("Missing H1 tag".to_string());
        } else if result.h1_tags.len() > 1 {
            findings.push(format!("Multiple H1 tags ({})", result.h1_tags.len()));
        }
        if result.images_missing_alt > 0 {
            findings.push(format!(
                "{} image(s) missing alt text",
                result.images_missing_alt
            ));
        }

        if !findings.is_empty() {
            result.status = result.status.escalate(PageStatus::Warning);
            result.issues.extend(findings);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_full_page() {
        let html = r#"<html><head>
            <title> Home </title>
            <meta name="description" content="A fine site">
            <meta name="robots" content="index,follow">
            <link rel="canonical" href="https://example.com/">
        </head><body>
            <h1>Welcome</h1>
            <img src="/a.png" alt="logo">
            <img src="/b.png">
        </body></html>"#;

        let result = PageAnalyzer::extract("https://example.com/", html);
        assert_eq!(result.title, Some("Home".to_string()));
        assert_eq!(result.meta_description, Some("A fine site".to_string()));
        assert_eq!(result.meta_robots, Some("index,follow".to_string()));
        assert_eq!(result.canonical, Some("https://example.com/".to_string()));
        assert_eq!(result.h1_tags, vec!["Welcome".to_string()]);
        assert_eq!(result.image_count, 2);
        assert_eq!(result.images_missing_alt, 1);
        assert_eq!(result.status, PageStatus::Warning);
        assert!(result.issues.iter().any(|i| i.contains("alt text")));
    }

    #[test]
    fn test_extract_clean_page_is_ok() {
        let html = r#"<html><head>
            <title>Clean</title>
            <meta name="description" content="All good">
        </head><body><h1>One heading</h1></body></html>"#;

        let result = PageAnalyzer::extract("https://example.com/clean", html);
        assert_eq!(result.status, PageStatus::Ok);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_extract_bare_page_collects_findings() {
        let result = PageAnalyzer::extract("https://example.com/bare", "<html><body></body></html>");
        assert_eq!(result.status, PageStatus::Warning);
        assert!(result.issues.iter().any(|i| i.contains("title")));
        assert!(result.issues.iter().any(|i| i.contains("meta description")));
        assert!(result.issues.iter().any(|i| i.contains("H1")));
    }

    #[test]
    fn test_empty_title_treated_as_missing() {
        let html = "<html><head><title>   </title></head><body><h1>H</h1></body></html>";
        let result = PageAnalyzer::extract("https://example.com/", html);
        assert_eq!(result.title, None);
        assert!(result.issues.iter().any(|i| i.contains("title")));
    }

    #[test]
    fn test_multiple_h1_flagged() {
        let html = r#"<html><head><title>T</title>
            <meta name="description" content="D"></head>
            <body><h1>A</h1><h1>B</h1></body></html>"#;
        let result = PageAnalyzer::extract("https://example.com/", html);
        assert!(result.issues.iter().any(|i| i.contains("Multiple H1")));
        assert_eq!(result.status, PageStatus::Warning);
    }
}
