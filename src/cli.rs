// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - analyze:    build a digest for one repository
// - rate-limit: show how many GitHub API calls are left
//
// Settings that usually don't change between runs (the API URL) can also
// come from the environment, so `GITHUB_API_URL=http://proxy ...` works.
// =============================================================================

use clap::{Args, Parser, Subcommand};

use crate::config::{AccessMode, DEFAULT_API_URL, DEFAULT_MAX_FILE_SIZE_KB, DEFAULT_TIMEOUT_SECS};

#[derive(Parser, Debug)]
#[command(
    name = "repo-digest",
    version,
    about = "Turn a public GitHub repository into a readable digest",
    long_about = "repo-digest fetches a repository's metadata and file tree from the GitHub API, \
                  filters and prioritizes the files, and prints a digest with the content of the \
                  most important ones. Use --json for the structured form."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a digest for a GitHub repository
    ///
    /// Example: repo-digest analyze https://github.com/rust-lang/log --exclude "*.lock,tests/"
    Analyze {
        /// GitHub repository URL (e.g., https://github.com/user/repo)
        repo_url: String,

        /// Comma separated exclude patterns: "*.ext", "dir/" or a name
        #[arg(long, short = 'e', default_value = "")]
        exclude: String,

        /// Skip files larger than this many KB
        #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE_KB)]
        max_file_size_kb: u64,

        /// Access profile: "direct" fetches 3 files by path,
        /// "backend" fetches 5 files by blob sha
        #[arg(long, value_enum, default_value_t = AccessMode::Backend)]
        mode: AccessMode,

        /// How many files get their content included (overrides the profile)
        #[arg(long)]
        max_files: Option<usize>,

        /// Print the {digest, structured, rateLimit} JSON object
        #[arg(long)]
        json: bool,

        /// Also print the directory tree
        #[arg(long)]
        tree: bool,

        /// Write the text digest to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<String>,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Show the current GitHub API rate limit
    RateLimit {
        /// Output in JSON format
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        api: ApiArgs,
    },
}

#[derive(Args, Debug)]
pub struct ApiArgs {
    /// Base URL of the GitHub API (or a proxy serving the same endpoints)
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Timeout for each request to GitHub, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}
