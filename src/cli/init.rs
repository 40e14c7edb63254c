//! Init command implementation
//!
//! Writes a starter `ragcheck.toml` and `.env.example`.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// ragcheck.toml already exists
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Provider for chat and embedding models (openai or ollama)
    pub provider: String,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing ragcheck");

    let base_path = &config.path;
    let config_path = base_path.join("ragcheck.toml");
    if config_path.exists() && !config.force {
        output.warning("ragcheck.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.error(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
    }

    let toml_content = generate_config_toml(&config);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create ragcheck.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.file("config", "ragcheck.toml", None);

    let env_example_path = base_path.join(".env.example");
    if env_example_path.exists() && !config.force {
        output.file("env", ".env.example", Some("already exists"));
    } else if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        output.file("env", ".env.example", None);
    }

    output.complete("ragcheck initialized");

    output.header("Next Steps");
    if config.provider == "ollama" {
        output.suggest(
            "1. Set up environment variables:",
            &["cp .env.example .env", "# Edit .env and set LANGCHAIN_API_KEY"],
        );
        output.suggest(
            "2. Pull the models:",
            &["ollama pull llama3.1 && ollama pull nomic-embed-text"],
        );
        output.suggest("3. Run the evaluation:", &["ragcheck eval"]);
    } else {
        output.suggest(
            "1. Set up environment variables:",
            &[
                "cp .env.example .env",
                "# Edit .env and set OPENAI_API_KEY and LANGCHAIN_API_KEY",
            ],
        );
        output.suggest("2. Run the evaluation:", &["ragcheck eval"]);
    }

    output.hint("Set tracking.backend = \"memory\" to evaluate without a tracking account");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_config_toml(config: &InitConfig) -> String {
    let (provider_section, provider, generator, grader, embedding) = if config.provider == "ollama"
    {
        (
            r#"[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
"#,
            "ollama",
            "llama3.1",
            "llama3.1",
            "nomic-embed-text",
        )
    } else {
        (
            r#"[providers.openai]
type = "openai"
api_key_env = "OPENAI_API_KEY"
api_base = "https://api.openai.com/v1"
"#,
            "openai",
            "gpt-3.5-turbo-16k",
            "gpt-4",
            "text-embedding-ada-002",
        )
    };

    format!(
        r#"# ragcheck configuration
# Secrets are read from the environment variables named here (see .env.example).

[logging]
# Used when RUST_LOG is not set
level = "info"

[tracking]
# "remote" (LangSmith-compatible API) or "memory" (nothing leaves the process)
backend = "remote"
endpoint = "https://api.smith.langchain.com"
endpoint_env = "LANGCHAIN_ENDPOINT"
api_key_env = "LANGCHAIN_API_KEY"
project_env = "LANGCHAIN_PROJECT"
dataset_prefix = "Retrieval QA Questions"

{provider_section}
[models.generator]
provider = "{provider}"
model = "{generator}"
temperature = 0.0

[models.grader]
provider = "{provider}"
model = "{grader}"
temperature = 0.0

[embeddings]
provider = "{provider}"
model = "{embedding}"
batch_size = 64

[ingest]
root_url = "https://docs.smith.langchain.com"
max_depth = 2
max_pages = 200
delay_ms = 0
timeout_secs = 30
# Token budget per chunk (cl100k_base)
chunk_size = 2000
chunk_overlap = 200

[retrieval]
k = 4

[evaluation]
variants = ["baseline", "strict"]
max_concurrency = 4
feedback_key = "correctness"
# examples_file = "examples.json"
"#
    )
}

fn generate_env_example() -> String {
    r#"# ragcheck environment variables
# Copy this file to .env and fill in the values.

# Tracking service
LANGCHAIN_API_KEY=your-api-key-here
# LANGCHAIN_ENDPOINT=https://api.smith.langchain.com
# LANGCHAIN_PROJECT=ragcheck

# Model provider (if using OpenAI)
OPENAI_API_KEY=sk-...

# Optional: Logging filter (overrides [logging] level)
# RUST_LOG=info,ragcheck=debug
"#
    .to_string()
}
