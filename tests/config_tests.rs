//! Configuration loading from files and wiring of the configured components

use ragcheck::llm::{LLMClientFactory, Provider};
use ragcheck::rag::create_embedding_client;
use ragcheck::tracking::create_tracker;
use ragcheck::utils::toml_config::{ConfigError, RagcheckConfig, TrackingBackend};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const OFFLINE_CONFIG: &str = r#"
[logging]
level = "warn"

[tracking]
backend = "memory"
dataset_prefix = "Offline QA"

[providers.local]
type = "ollama"
base_url = "http://localhost:11434"

[models.generator]
provider = "local"
model = "llama3.1"

[models.grader]
provider = "local"
model = "llama3.1:70b"

[embeddings]
provider = "local"
model = "nomic-embed-text"
batch_size = 16

[ingest]
root_url = "https://docs.example.com/guide"
max_depth = 1
chunk_size = 500
chunk_overlap = 50

[retrieval]
k = 6

[evaluation]
variants = ["strict"]
max_concurrency = 2
"#;

#[test]
fn test_load_offline_config() {
    let file = write_config(OFFLINE_CONFIG);
    let config = RagcheckConfig::load(file.path()).unwrap();

    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.tracking.backend, TrackingBackend::Memory);
    assert_eq!(config.tracking.dataset_prefix, "Offline QA");
    assert_eq!(config.models.grader.model, "llama3.1:70b");
    assert_eq!(config.models.generator.temperature, 0.0);
    assert_eq!(config.embeddings.batch_size, 16);
    assert_eq!(config.ingest.max_depth, 1);
    // unset fields keep their defaults
    assert_eq!(config.ingest.max_pages, 200);
    assert_eq!(config.retrieval.k, 6);
    assert_eq!(config.evaluation.feedback_key, "correctness");
    assert_eq!(config.prompt_variants().unwrap().len(), 1);

    // nothing in this setup needs a secret
    config.validate_env().unwrap();
}

#[cfg(feature = "ollama")]
#[tokio::test]
async fn test_offline_config_builds_components() {
    let file = write_config(OFFLINE_CONFIG);
    let config = RagcheckConfig::load(file.path()).unwrap();

    let tracker = create_tracker(&config).unwrap();
    assert_eq!(tracker.backend_name(), "memory");

    let embedder = create_embedding_client(&config).unwrap();
    assert_eq!(embedder.model_name(), "nomic-embed-text");

    let provider = LLMClientFactory::from_config(&config)
        .provider_for(&config.models.grader)
        .unwrap();
    match provider {
        Provider::Ollama {
            base_url,
            model,
            temperature,
        } => {
            assert_eq!(base_url, "http://localhost:11434");
            assert_eq!(model, "llama3.1:70b");
            assert_eq!(temperature, 0.0);
        }
        other => panic!("expected Ollama provider, got {:?}", other),
    }
}

#[test]
fn test_missing_openai_key_is_reported_by_name() {
    let file = write_config(
        r#"
[tracking]
backend = "memory"

[providers.openai]
type = "openai"
api_key_env = "RAGCHECK_TEST_UNSET_OPENAI_KEY"
"#,
    );
    let config = RagcheckConfig::load(file.path()).unwrap();

    match config.validate_env() {
        Err(ConfigError::MissingEnvVar(name)) => {
            assert_eq!(name, "RAGCHECK_TEST_UNSET_OPENAI_KEY")
        }
        other => panic!("expected missing env var, got {:?}", other),
    }

    let factory = LLMClientFactory::from_config(&config);
    assert!(factory.provider_for(&config.models.generator).is_err());
}

#[test]
fn test_invalid_files_are_rejected() {
    let file = write_config("[retrieval\nk = 4");
    assert!(matches!(
        RagcheckConfig::load(file.path()),
        Err(ConfigError::ParseError(_))
    ));

    let file = write_config("[ingest]\nchunk_size = 100\nchunk_overlap = 100\n");
    assert!(matches!(
        RagcheckConfig::load(file.path()),
        Err(ConfigError::ValidationError(_))
    ));

    let file = write_config("[models.generator]\nprovider = \"nowhere\"\nmodel = \"m\"\n");
    assert!(matches!(
        RagcheckConfig::load(file.path()),
        Err(ConfigError::MissingProvider(_, _))
    ));

    let file = write_config("[evaluation]\nvariants = [\"baseline\", \"verbose\"]\n");
    assert!(matches!(
        RagcheckConfig::load(file.path()),
        Err(ConfigError::UnknownVariant(_))
    ));

    let file = write_config("[evaluation]\nvariants = []\n");
    assert!(matches!(
        RagcheckConfig::load(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragcheck.toml");

    assert!(matches!(
        RagcheckConfig::load(&path),
        Err(ConfigError::FileNotFound(_))
    ));

    let config = RagcheckConfig::load_or_default(&path).unwrap();
    assert_eq!(config.models.generator.model, "gpt-3.5-turbo-16k");
    assert_eq!(config.models.grader.model, "gpt-4");
    assert_eq!(config.ingest.chunk_size, 2000);
    assert_eq!(config.ingest.chunk_overlap, 200);
    assert_eq!(config.retrieval.k, 4);
}

#[test]
fn test_rendered_config_loads_back() {
    let file = write_config(OFFLINE_CONFIG);
    let config = RagcheckConfig::load(file.path()).unwrap();

    let rendered = write_config(&config.to_toml().unwrap());
    let reloaded = RagcheckConfig::load(rendered.path()).unwrap();
    assert_eq!(reloaded.models.grader.model, config.models.grader.model);
    assert_eq!(reloaded.ingest.root_url, config.ingest.root_url);
    assert_eq!(reloaded.evaluation.variants, config.evaluation.variants);
}
