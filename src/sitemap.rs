use anyhow::{Context, Result, anyhow};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::header::CONTENT_TYPE;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

/// Conventional sitemap locations probed before falling back to robots.txt.
const SITEMAP_PROBE_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemap1.xml"];

/// Pause between child-sitemap fetches during index expansion. Deliberately a
/// fixed constant, independent of the configured page-fetch delay.
const SITEMAP_CHILD_DELAY: Duration = Duration::from_millis(500);

/// A fetched sitemap document is either an index pointing at child sitemaps
/// or a leaf listing page URLs directly.
#[derive(Debug, PartialEq, Eq)]
enum SitemapDocument {
    Index(Vec<String>),
    Leaf(Vec<String>),
}

/// Discovers a site's sitemap and expands sitemap indexes into a flat,
/// deduplicated page-URL set.
pub struct SitemapResolver {
    client: reqwest::Client,
}

impl SitemapResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Locates the sitemap for `base`: conventional paths first, then any
    /// `Sitemap:` directive in robots.txt. Individual probe failures are
    /// swallowed; only total exhaustion is an error.
    pub async fn find_sitemap(&self, base: &Url) -> Result<Url> {
        for path in SITEMAP_PROBE_PATHS {
            let Ok(candidate) = base.join(path) else {
                continue;
            };
            if let Some(found) = self.probe_xml(&candidate).await {
                tracing::info!(sitemap = %found, "Found sitemap at conventional path");
                return Ok(found);
            }
        }

        if let Ok(robots_url) = base.join("/robots.txt")
            && let Ok(response) = self.client.get(robots_url).send().await
            && response.status().is_success()
        {
            let body = response.text().await.unwrap_or_default();
            for line in body.lines() {
                let line = line.trim();
                let Some(declared) = strip_sitemap_directive(line) else {
                    continue;
                };
                let Ok(declared_url) =
                    Url::parse(declared).or_else(|_| base.join(declared))
                else {
                    continue;
                };
                if self.exists(&declared_url).await {
                    tracing::info!(sitemap = %declared_url, "Found sitemap via robots.txt");
                    return Ok(declared_url);
                }
            }
        }

        Err(anyhow!("No sitemap found for {}", base))
    }

    /// Expands `sitemap_url` into the full page-URL set. Sitemap indexes are
    /// walked with an explicit worklist and a visited set, so cyclic or
    /// duplicate index references terminate. Per-sitemap failures are logged
    /// and skipped; siblings still get processed.
    pub async fn resolve(&self, sitemap_url: Url) -> Result<Vec<String>> {
        let mut pending = VecDeque::from([sitemap_url.to_string()]);
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages: HashSet<String> = HashSet::new();

        while let Some(url) = pending.pop_front() {
            if !visited.insert(url.clone()) {
                continue;
            }
            if visited.len() > 1 {
                tokio::time::sleep(SITEMAP_CHILD_DELAY).await;
            }

            match self.fetch_and_parse(&url).await {
                Ok(SitemapDocument::Index(children)) => {
                    tracing::info!(sitemap = %url, children = children.len(), "Expanding sitemap index");
                    for child in children {
                        if !visited.contains(&child) {
                            pending.push_back(child);
                        }
                    }
                }
                Ok(SitemapDocument::Leaf(locs)) => {
                    pages.extend(locs);
                }
                Err(e) => {
                    tracing::warn!(sitemap = %url, error = %e, "Skipping unreadable sitemap");
                }
            }
        }

        let mut urls: Vec<String> = pages.into_iter().collect();
        urls.sort();
        Ok(urls)
    }

    async fn fetch_and_parse(&self, url: &str) -> Result<SitemapDocument> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch sitemap {}", url))?
            .error_for_status()
            .with_context(|| format!("Sitemap request failed for {}", url))?;
        let bytes = response.bytes().await?;
        parse_sitemap_xml(&bytes)
    }

    /// HEAD probe that accepts a candidate only when it responds successfully
    /// with an XML content type. Follows redirects and returns the final URL.
    async fn probe_xml(&self, url: &Url) -> Option<Url> {
        let response = self.client.head(url.clone()).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)?
            .to_str()
            .ok()?
            .to_lowercase();
        if content_type.contains("xml") {
            Some(response.url().clone())
        } else {
            None
        }
    }

    async fn exists(&self, url: &Url) -> bool {
        matches!(
            self.client.head(url.clone()).send().await,
            Ok(response) if response.status().is_success()
        )
    }
}

fn strip_sitemap_directive(line: &str) -> Option<&str> {
    let (head, rest) = line.split_at_checked(8)?;
    if head.eq_ignore_ascii_case("sitemap:") {
        Some(rest.trim())
    } else {
        None
    }
}

/// Streaming parse of a sitemap document. The root element discriminates
/// index (`<sitemapindex>`) from leaf (`<urlset>`); all `<loc>` text values
/// are collected under that discrimination. Namespace prefixes are tolerated
/// by matching on local-name suffixes.
fn parse_sitemap_xml(data: &[u8]) -> Result<SitemapDocument> {
    let mut reader = Reader::from_reader(data);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut is_index = false;
    let mut saw_root = false;
    let mut in_loc = false;
    let mut locs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                if !saw_root {
                    saw_root = true;
                    is_index = name.ends_with(b"sitemapindex");
                }
                if name.ends_with(b"loc") {
                    in_loc = true;
                }
            }
            Ok(Event::Text(t)) => {
                if in_loc {
                    let loc = t.unescape().unwrap_or_default().trim().to_string();
                    if !loc.is_empty() {
                        locs.push(loc);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref().to_ascii_lowercase().ends_with(b"loc") {
                    in_loc = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("XML parse error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(anyhow!("Document has no root element"));
    }

    if is_index {
        Ok(SitemapDocument::Index(locs))
    } else {
        Ok(SitemapDocument::Leaf(locs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leaf_sitemap() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/about</loc></url>
</urlset>"#;

        let doc = parse_sitemap_xml(xml.as_bytes()).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::Leaf(vec![
                "https://example.com/".to_string(),
                "https://example.com/about".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/sitemap-a.xml</loc></sitemap>
  <sitemap><loc>https://example.com/sitemap-b.xml</loc></sitemap>
</sitemapindex>"#;

        let doc = parse_sitemap_xml(xml.as_bytes()).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::Index(vec![
                "https://example.com/sitemap-a.xml".to_string(),
                "https://example.com/sitemap-b.xml".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_namespaced_prefix() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sm:url><sm:loc>https://example.com/page</sm:loc></sm:url>
</sm:urlset>"#;

        let doc = parse_sitemap_xml(xml.as_bytes()).unwrap();
        assert_eq!(
            doc,
            SitemapDocument::Leaf(vec!["https://example.com/page".to_string()])
        );
    }

    #[test]
    fn test_parse_empty_document_fails() {
        assert!(parse_sitemap_xml(b"").is_err());
    }

    #[test]
    fn test_index_pointers_do_not_count_as_pages() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/child.xml</loc></sitemap>
</sitemapindex>"#;

        match parse_sitemap_xml(xml.as_bytes()).unwrap() {
            SitemapDocument::Index(children) => {
                assert_eq!(children, vec!["https://example.com/child.xml".to_string()]);
            }
            SitemapDocument::Leaf(_) => panic!("index parsed as leaf"),
        }
    }

    #[test]
    fn test_strip_sitemap_directive() {
        assert_eq!(
            strip_sitemap_directive("Sitemap: https://example.com/sitemap.xml"),
            Some("https://example.com/sitemap.xml")
        );
        assert_eq!(
            strip_sitemap_directive("sitemap:https://example.com/s.xml"),
            Some("https://example.com/s.xml")
        );
        assert_eq!(strip_sitemap_directive("Disallow: /admin"), None);
        assert_eq!(strip_sitemap_directive(""), None);
    }
}
