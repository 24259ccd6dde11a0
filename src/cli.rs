use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sitelint")]
#[command(about = "A sitemap-driven SEO auditor and broken-link checker", long_about = None)]
pub struct Cli {
    /// The site URL to audit (must start with http:// or https://)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Save the JSON report to a file
    #[arg(short, long)]
    pub output: Option<String>,

    /// HTTP request timeout in seconds (default: 10)
    #[arg(short, long, default_value_t = 10)]
    pub timeout: u64,

    /// Delay between page requests in seconds (default: 0.5)
    #[arg(short, long, default_value_t = 0.5)]
    pub delay: f64,

    /// Number of parallel workers for link validation (default: 5)
    #[arg(short, long, default_value_t = 5)]
    pub workers: usize,

    /// Limit the number of analyzed pages (useful for testing)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Skip broken-link validation (faster audit)
    #[arg(long)]
    pub skip_links: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to configuration file (JSON, TOML, or YAML)
    #[arg(long)]
    pub config: Option<String>,
}
