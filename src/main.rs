// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, to stderr, filtered by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the appropriate subcommand handler
// 4. Print the digest (text or JSON)
// 5. Exit with proper code (0 = success, 1 = not found / bad input, 2 = error)
// =============================================================================

mod cli;
mod config;
mod digest;
mod error;
mod github;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{ApiArgs, Cli, Commands};
use config::{AccessMode, GatewayConfig};
use digest::{AnalyzeRequest, ContentResult, FilterConfig};
use error::DigestError;
use github::{GitHubClient, RepositoryGateway};

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so `--json` output on stdout stays machine readable.
// Default level is "warn"; RUST_LOG=repo_digest=debug shows every request.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            repo_url,
            exclude,
            max_file_size_kb,
            mode,
            max_files,
            json,
            tree,
            output,
            api,
        } => {
            let options = AnalyzeOptions {
                exclude_patterns: digest::parse_exclude_patterns(&exclude),
                max_file_size_kb,
                mode,
                max_files: max_files.unwrap_or_else(|| mode.default_max_files()),
                json,
                tree,
                output,
            };
            handle_analyze(&repo_url, options, &api).await
        }
        Commands::RateLimit { json, api } => handle_rate_limit(json, &api).await,
    }
}

struct AnalyzeOptions {
    exclude_patterns: Vec<String>,
    max_file_size_kb: u64,
    mode: AccessMode,
    max_files: usize,
    json: bool,
    tree: bool,
    output: Option<String>,
}

async fn handle_analyze(repo_url: &str, options: AnalyzeOptions, api: &ApiArgs) -> Result<i32> {
    let (owner, repo) = match github::parse_repo_url(repo_url) {
        Ok(parsed) => parsed,
        Err(e) => return Ok(report_failure(&DigestError::Validation(e.to_string()), options.json)),
    };

    let gateway = GitHubClient::new(&GatewayConfig::new(options.mode, &api.api_url, api.timeout_secs))
        .context("Failed to set up the GitHub client")?;

    if !options.json {
        eprintln!("🔍 Analyzing GitHub repository: {}/{}", owner, repo);
    }

    let request = AnalyzeRequest {
        owner,
        repo,
        filter: FilterConfig::new(options.exclude_patterns, options.max_file_size_kb),
        max_files: options.max_files,
    };

    let digest = match digest::analyze(&gateway, &request).await {
        Ok(digest) => digest,
        Err(e) => return Ok(report_failure(&e, options.json)),
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&digest)?);
        return Ok(0);
    }

    let mut text = digest.text.clone();
    if options.tree {
        text.push_str("## Directory Tree\n\n");
        text.push_str(&digest.structured.directory_structure.render());
    }

    match &options.output {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("Failed to write digest to {}", path))?;
            eprintln!("💾 Digest written to {}", path);
        }
        None => println!("{}", text),
    }

    let stats = &digest.structured.file_stats;
    let fetched = digest.structured.files.iter().filter(|f| f.is_fetched()).count();
    let failed: Vec<&str> = digest
        .structured
        .files
        .iter()
        .filter(|f| !f.is_fetched())
        .map(ContentResult::path)
        .collect();

    eprintln!("📊 Summary:");
    eprintln!("   📄 Files after filtering: {} ({})", stats.total_count, stats.total_size);
    eprintln!("   ✅ Content included: {}", fetched);
    if !failed.is_empty() {
        eprintln!("   ❌ Could not fetch: {}", failed.join(", "));
    }
    print_rate_limit_warning(digest.rate_limit.remaining);

    Ok(0)
}

async fn handle_rate_limit(json: bool, api: &ApiArgs) -> Result<i32> {
    // The lookup mode doesn't matter for /rate_limit
    let gateway = GitHubClient::new(&GatewayConfig::new(AccessMode::Direct, &api.api_url, api.timeout_secs))
        .context("Failed to set up the GitHub client")?;

    let rate = gateway
        .get_rate_limit()
        .await
        .context("Failed to read the GitHub rate limit")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rate)?);
    } else {
        println!("Limit:     {}", rate.limit);
        println!("Remaining: {}", rate.remaining);
        println!("Resets at: {} (epoch seconds)", rate.reset);
    }

    Ok(0)
}

// Prints the failure and returns the exit code for it
fn report_failure(error: &DigestError, json: bool) -> i32 {
    if json {
        match serde_json::to_string_pretty(&error.to_response()) {
            Ok(body) => println!("{}", body),
            Err(_) => eprintln!("Error: {}", error),
        }
    } else {
        eprintln!("❌ {}", error.message());
        if !matches!(error, DigestError::Validation(_)) {
            eprintln!("   {}", error);
        }
    }

    if error.is_not_found() || matches!(error, DigestError::Validation(_)) {
        1
    } else {
        2
    }
}

fn print_rate_limit_warning(remaining: u64) {
    if remaining < 10 {
        eprintln!(
            "⚠️  Only {} GitHub API requests left this hour. Use --mode direct to fetch fewer files.",
            remaining
        );
    }
}
