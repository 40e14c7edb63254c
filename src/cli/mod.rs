//! CLI module for ragcheck
//!
//! Provides command-line interface parsing for the `ragcheck` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragcheck - Retrieval QA correctness evaluation
///
/// Builds a labeled dataset, indexes a documentation site and grades a RAG
/// pipeline's answers with an LLM-as-judge.
#[derive(Parser, Debug)]
#[command(
    name = "ragcheck",
    version,
    about = "ragcheck - Retrieval QA correctness evaluation",
    long_about = "Evaluates the correctness of a retrieval-augmented question-answering pipeline.\n\n\
                  Crawls a documentation site, indexes it, answers a labeled set of questions\n\
                  and has a grader model score every answer against its reference.",
    after_help = "EXAMPLES:\n    \
                  ragcheck init                                 # Write a starter ragcheck.toml\n    \
                  ragcheck ask \"How do I log a trace?\"          # Stream one answer\n    \
                  ragcheck eval                                 # Evaluate every configured variant\n    \
                  ragcheck eval -V strict -o report.json        # Evaluate one variant, save the report"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ragcheck.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter ragcheck.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Provider for chat and embedding models (openai or ollama)
        #[arg(long, default_value = "openai")]
        provider: String,
    },

    /// Show the resolved configuration
    Config {
        /// Also check that required environment variables are set
        #[arg(long)]
        validate: bool,
    },

    /// Register the labeled examples as a new dataset
    Dataset {
        /// JSON file of {"question", "answer"} pairs (defaults to the built-in set)
        #[arg(short, long)]
        examples: Option<PathBuf>,
    },

    /// Crawl and chunk the documentation site
    Ingest {
        /// Root URL to crawl (overrides ingest.root_url)
        #[arg(long)]
        root_url: Option<String>,
    },

    /// Answer one question through the RAG chain, streaming the reply
    Ask {
        /// The question to answer
        question: String,

        /// Prompt variant (baseline or strict)
        #[arg(short = 'V', long, default_value = "baseline")]
        variant: String,

        /// Root URL to crawl (overrides ingest.root_url)
        #[arg(long)]
        root_url: Option<String>,
    },

    /// Run the full evaluation workflow
    Eval {
        /// Prompt variants to evaluate (defaults to evaluation.variants)
        #[arg(short = 'V', long = "variant")]
        variants: Vec<String>,

        /// Write the reports as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file of {"question", "answer"} pairs (overrides evaluation.examples_file)
        #[arg(short, long)]
        examples: Option<PathBuf>,

        /// Root URL to crawl (overrides ingest.root_url)
        #[arg(long)]
        root_url: Option<String>,

        /// Examples evaluated in parallel (overrides evaluation.max_concurrency)
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
