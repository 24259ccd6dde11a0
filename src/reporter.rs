use crate::models::{AuditReport, AuditSummary, PageResult, PageStatus};
use anyhow::Result;
use colored::*;
use std::fs::File;
use std::io::Write;

pub struct Reporter;

impl Reporter {
    pub fn generate_report(
        start_url: &str,
        pages: Vec<PageResult>,
        duplicate_titles: Vec<String>,
        duplicate_descriptions: Vec<String>,
    ) -> AuditReport {
        let summary = Self::calculate_summary(&pages);
        let timestamp = chrono::Utc::now().to_rfc3339();

        AuditReport {
            start_url: start_url.to_string(),
            pages,
            duplicate_titles,
            duplicate_descriptions,
            summary,
            timestamp,
        }
    }

    fn calculate_summary(pages: &[PageResult]) -> AuditSummary {
        let mut ok_pages = 0;
        let mut warning_pages = 0;
        let mut error_pages = 0;
        let mut total_broken_links = 0;

        for page in pages {
            match page.status {
                PageStatus::Ok => ok_pages += 1,
                PageStatus::Warning => warning_pages += 1,
                PageStatus::Error => error_pages += 1,
            }
            total_broken_links += page.broken_links_count;
        }

        AuditSummary {
            total_pages: pages.len(),
            ok_pages,
            warning_pages,
            error_pages,
            total_broken_links,
        }
    }

    pub fn print_text_report(report: &AuditReport) {
        println!("\n{}", "=".repeat(80).bright_blue());
        println!("{}", "Sitelint - SEO Audit Report".bright_cyan().bold());
        println!("{}", "=".repeat(80).bright_blue());
        println!();

        println!("{}: {}", "Site".bright_white().bold(), report.start_url);
        println!("{}: {}", "Timestamp".bright_white().bold(), report.timestamp);
        println!();

        println!("{}", "Summary".bright_yellow().bold().underline());
        println!(
            "  Pages analyzed:     {}",
            report.summary.total_pages.to_string().bright_green()
        );
        println!(
            "  OK pages:           {}",
            report.summary.ok_pages.to_string().bright_green()
        );
        println!(
            "  Pages with warnings:{}",
            if report.summary.warning_pages > 0 {
                format!(" {}", report.summary.warning_pages).yellow()
            } else {
                format!(" {}", report.summary.warning_pages).bright_green()
            }
        );
        println!(
            "  Pages with errors:  {}",
            if report.summary.error_pages > 0 {
                report.summary.error_pages.to_string().bright_red()
            } else {
                report.summary.error_pages.to_string().bright_green()
            }
        );
        println!(
            "  Broken targets:     {}",
            if report.summary.total_broken_links > 0 {
                report.summary.total_broken_links.to_string().bright_red()
            } else {
                report.summary.total_broken_links.to_string().bright_green()
            }
        );
        if !report.duplicate_titles.is_empty() {
            println!(
                "  Duplicate titles:   {}",
                report.duplicate_titles.len().to_string().yellow()
            );
        }
        if !report.duplicate_descriptions.is_empty() {
            println!(
                "  Duplicate descriptions: {}",
                report.duplicate_descriptions.len().to_string().yellow()
            );
        }
        println!();

        let pages_with_issues: Vec<_> = report
            .pages
            .iter()
            .filter(|page| !page.issues.is_empty())
            .collect();

        if !pages_with_issues.is_empty() {
            println!("{}", "Pages with Issues".bright_yellow().bold().underline());
            for page in pages_with_issues {
                println!();
                println!("  {} {}", "URL:".bright_white().bold(), page.url);
                let status_str = match page.status {
                    PageStatus::Ok => "ok".bright_green(),
                    PageStatus::Warning => "warning".yellow(),
                    PageStatus::Error => "error".bright_red(),
                };
                println!("    Status: {}", status_str);
                if let Some(title) = &page.title {
                    println!("    Title:  {}", title.bright_white());
                }
                println!("    Issues:");
                for issue in &page.issues {
                    println!("      - {}", issue);
                }
                for broken in page.broken_links.iter().chain(page.broken_images.iter()) {
                    println!("      {} {}", "broken:".bright_red(), broken);
                }
            }
        }

        println!();
        println!("{}", "=".repeat(80).bright_blue());
    }

    pub fn save_json_report(report: &AuditReport, filename: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(filename)?;
        file.write_all(json.as_bytes())?;
        println!("Report saved to: {}", filename.bright_green());
        Ok(())
    }
}
