pub mod aggregator;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod http_client;
pub mod link_checker;
pub mod models;
pub mod reporter;
pub mod sitemap;

use anyhow::{Context, Result, bail};
use analyzer::PageAnalyzer;
use cli::Cli;
use colored::*;
use config::Config;
use http_client::build_http_client;
use indicatif::{ProgressBar, ProgressStyle};
use link_checker::LinkChecker;
use models::AuditReport;
use reporter::Reporter;
use sitemap::SitemapResolver;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Link checking issues far more requests per page than page fetching, so
/// its per-worker delay is capped well below the page-fetch delay.
const MAX_LINK_CHECK_DELAY: f64 = 0.1;

/// Pipeline configuration, resolved from CLI arguments and config files.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub timeout: u64,
    pub delay: f64,
    pub workers: usize,
    pub limit: Option<usize>,
    pub skip_links: bool,
    /// Step banners and progress bars; off when driven from tests.
    pub progress: bool,
}

impl AuditOptions {
    pub fn from_cli(args: &Cli) -> Self {
        Self {
            timeout: args.timeout,
            delay: args.delay,
            workers: args.workers,
            limit: args.limit,
            skip_links: args.skip_links,
            progress: true,
        }
    }
}

/// Runs the full audit pipeline: sitemap resolution, sequential page
/// analysis, bounded-concurrency link validation, duplicate detection and
/// final status aggregation.
pub async fn audit(start_url: &str, options: &AuditOptions) -> Result<AuditReport> {
    let client = build_http_client(options.timeout)?;
    let base = Url::parse(start_url).context("Invalid URL")?;

    // Stage 1: find and expand the sitemap. No sitemap at all is terminal;
    // so is a sitemap that lists nothing.
    if options.progress {
        println!("{}", "Step 1/4: Resolving sitemap...".bright_yellow());
    }
    let resolver = SitemapResolver::new(client.clone());
    let sitemap_url = resolver.find_sitemap(&base).await?;
    let mut urls = resolver.resolve(sitemap_url).await?;
    if urls.is_empty() {
        bail!("Sitemap found but contained no URLs");
    }
    if let Some(limit) = options.limit
        && limit > 0
        && urls.len() > limit
    {
        tracing::info!(limit, total = urls.len(), "Truncating URL list");
        urls.truncate(limit);
    }
    if options.progress {
        println!("Found {} URL(s) to analyze", urls.len());
    }

    // Stage 2: one page in flight at a time, each preceded by the configured
    // delay. Politeness, not an accident.
    if options.progress {
        println!("{}", "Step 2/4: Analyzing pages...".bright_yellow());
    }
    let analyzer = PageAnalyzer::new(client.clone(), Duration::from_secs_f64(options.delay));
    let pb = page_progress_bar(options, urls.len());
    let mut results = Vec::with_capacity(urls.len());
    for url in &urls {
        results.push(analyzer.scrape(url).await);
        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    // Stage 3: link validation, the one parallel stage. Skipped entirely
    // when requested; failed pages keep their verdict and are not re-fetched.
    if options.skip_links {
        if options.progress {
            println!("{}", "Step 3/4: Link validation skipped".bright_yellow());
        }
    } else {
        if options.progress {
            println!("{}", "Step 3/4: Validating links...".bright_yellow());
        }
        let link_delay = options.delay.min(MAX_LINK_CHECK_DELAY);
        let checker = LinkChecker::new(
            client.clone(),
            options.workers,
            Duration::from_secs_f64(link_delay),
        );
        let pb = page_progress_bar(options, results.len());
        let mut validated = Vec::with_capacity(results.len());
        for result in results {
            if let Some(ref pb) = pb {
                pb.inc(1);
            }
            if result.error.is_some() {
                validated.push(result);
                continue;
            }
            let Ok(page_url) = Url::parse(&result.url) else {
                validated.push(result);
                continue;
            };
            match analyzer.fetch_html(&result.url).await {
                Ok(html) => {
                    let validation = checker.validate_page_links(&html, &page_url).await;
                    validated.push(result.with_link_validation(validation));
                }
                Err(e) => {
                    tracing::warn!(url = %result.url, error = %e, "Re-fetch for link validation failed");
                    validated.push(result);
                }
            }
        }
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        results = validated;
    }

    // Stage 4: whole-result-set pass.
    if options.progress {
        println!("{}", "Step 4/4: Detecting duplicates...".bright_yellow());
    }
    let (duplicate_titles, duplicate_descriptions) = aggregator::detect_duplicates(&results);
    let results = aggregator::annotate(results, &duplicate_titles, &duplicate_descriptions);

    Ok(Reporter::generate_report(
        start_url,
        results,
        duplicate_titles,
        duplicate_descriptions,
    ))
}

fn page_progress_bar(options: &AuditOptions, len: usize) -> Option<ProgressBar> {
    if !options.progress {
        return None;
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} pages")
            .expect("Progress bar template should be valid"),
    );
    Some(pb)
}

pub async fn run(args: Cli) -> Result<()> {
    // Config file values fill in anything the CLI left at its default.
    let args = match &args.config {
        Some(path) => Config::from_file(Path::new(path))?.merge_with_cli(&args),
        None => match Config::from_default_paths()? {
            Some(config) => config.merge_with_cli(&args),
            None => args,
        },
    };

    println!(
        "{}",
        "Sitelint - Sitemap SEO Auditor".bright_cyan().bold()
    );
    println!("{}", "=".repeat(50).bright_blue());
    println!();

    if !args.url.starts_with("http://") && !args.url.starts_with("https://") {
        bail!("URL must start with http:// or https://");
    }

    println!("{} {}", "Auditing:".bright_white().bold(), args.url);
    println!("{} {}s", "Timeout:".bright_white().bold(), args.timeout);
    println!("{} {}s", "Delay:".bright_white().bold(), args.delay);
    println!("{} {}", "Workers:".bright_white().bold(), args.workers);
    if let Some(limit) = args.limit {
        println!("{} {} pages", "Limit:".bright_white().bold(), limit);
    }
    println!();

    let options = AuditOptions::from_cli(&args);

    // A ctrl-c aborts the whole run; no partial-result salvage.
    let report = tokio::select! {
        report = audit(&args.url, &options) => report?,
        _ = tokio::signal::ctrl_c() => {
            bail!("Audit interrupted");
        }
    };

    if args.verbose {
        println!("{} {:#?}", "Pages:".bright_white().bold(), report.pages);
    }

    Reporter::print_text_report(&report);

    if let Some(filename) = &args.output {
        Reporter::save_json_report(&report, filename)?;
    }

    Ok(())
}
