use crate::models::{PageResult, PageStatus};
use std::collections::HashMap;

/// More than this many broken targets on one page forces an error verdict.
/// Fixed policy, not configurable.
const BROKEN_LINKS_ERROR_THRESHOLD: usize = 5;

/// Collects every non-empty title and meta description across the result set
/// and returns the values appearing on more than one page. Pages whose fetch
/// failed carry no extracted values and contribute nothing.
pub fn detect_duplicates(results: &[PageResult]) -> (Vec<String>, Vec<String>) {
    let mut title_counts: HashMap<&str, usize> = HashMap::new();
    let mut description_counts: HashMap<&str, usize> = HashMap::new();

    for result in results {
        if let Some(title) = result.title.as_deref().filter(|t| !t.is_empty()) {
            *title_counts.entry(title).or_insert(0) += 1;
        }
        if let Some(desc) = result.meta_description.as_deref().filter(|d| !d.is_empty()) {
            *description_counts.entry(desc).or_insert(0) += 1;
        }
    }

    let collect = |counts: HashMap<&str, usize>| {
        let mut values: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(value, _)| value.to_string())
            .collect();
        values.sort();
        values
    };

    (collect(title_counts), collect(description_counts))
}

/// Final aggregation pass: annotates each record with duplicate-metadata and
/// broken-link findings and computes its closing status. Consumes and
/// returns the records; escalation is strictly monotonic.
pub fn annotate(
    results: Vec<PageResult>,
    duplicate_titles: &[String],
    duplicate_descriptions: &[String],
) -> Vec<PageResult> {
    results
        .into_iter()
        .map(|mut result| {
            if let Some(title) = &result.title
                && duplicate_titles.contains(title)
            {
                result.issues.push(format!("Duplicate title: \"{}\"", title));
                result.status = result.status.escalate(PageStatus::Warning);
            }

            if let Some(desc) = &result.meta_description
                && duplicate_descriptions.contains(desc)
            {
                result
                    .issues
                    .push(format!("Duplicate meta description: \"{}\"", desc));
                result.status = result.status.escalate(PageStatus::Warning);
            }

            if result.broken_links_count > 0 {
                result.issues.push(format!(
                    "{} broken link(s)/image(s)",
                    result.broken_links_count
                ));
                result.status = result.status.escalate(PageStatus::Warning);
                if result.broken_links_count > BROKEN_LINKS_ERROR_THRESHOLD {
                    result.status = result.status.escalate(PageStatus::Error);
                }
            }

            result
        })
        .collect()
}
