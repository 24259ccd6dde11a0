use serde::{Deserialize, Serialize};

/// Severity of a page's overall verdict. Escalation is one-directional:
/// once a page is `Error` it never goes back to `Warning` or `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Ok,
    Warning,
    Error,
}

impl PageStatus {
    /// Raises the status to `to` if it is more severe, never lowers it.
    pub fn escalate(self, to: PageStatus) -> PageStatus {
        self.max(to)
    }
}

/// One analyzed page. Created by the analyzer, extended (never rewritten)
/// by the link-validation and aggregation stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_tags: Vec<String>,
    pub canonical: Option<String>,
    pub meta_robots: Option<String>,
    pub image_count: usize,
    pub images_missing_alt: usize,
    pub issues: Vec<String>,
    pub status: PageStatus,
    pub error: Option<String>,
    pub broken_links_count: usize,
    pub broken_links: Vec<String>,
    pub broken_images: Vec<String>,
}

impl PageResult {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: None,
            meta_description: None,
            h1_tags: vec![],
            canonical: None,
            meta_robots: None,
            image_count: 0,
            images_missing_alt: 0,
            issues: vec![],
            status: PageStatus::Ok,
            error: None,
            broken_links_count: 0,
            broken_links: vec![],
            broken_images: vec![],
        }
    }

    /// A page whose fetch or parse failed. Carries the reason and no
    /// extracted attributes; its status is final.
    pub fn failed(url: &str, reason: String) -> Self {
        let mut result = Self::new(url);
        result.issues.push(format!("Fetch failed: {}", reason));
        result.error = Some(reason);
        result.status = PageStatus::Error;
        result
    }

    /// Folds a link-validation outcome into a new record. Status escalation
    /// for broken links happens later, in the aggregation pass.
    pub fn with_link_validation(mut self, validation: LinkValidation) -> Self {
        self.broken_links_count = validation.total_broken;
        self.broken_links = validation.broken_links;
        self.broken_images = validation.broken_images;
        self
    }
}

/// What kind of target a link check covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Hyperlink,
    Image,
}

/// Result of checking a single target. Consumed immediately into the
/// per-page broken lists, never stored in the final report.
#[derive(Debug, Clone)]
pub struct LinkCheckOutcome {
    pub url: String,
    pub kind: LinkKind,
    pub reachable: bool,
    pub status: Option<u16>,
    pub reason: Option<String>,
}

/// Aggregate link-validation outcome for one page.
#[derive(Debug, Clone, Default)]
pub struct LinkValidation {
    pub broken_links: Vec<String>,
    pub broken_images: Vec<String>,
    pub total_broken: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub start_url: String,
    pub pages: Vec<PageResult>,
    pub duplicate_titles: Vec<String>,
    pub duplicate_descriptions: Vec<String>,
    pub summary: AuditSummary,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_pages: usize,
    pub ok_pages: usize,
    pub warning_pages: usize,
    pub error_pages: usize,
    pub total_broken_links: usize,
}
