//! ragcheck CLI Entry Point
//!
//! - `ragcheck init` - Write a starter configuration
//! - `ragcheck config` - Show (and validate) the resolved configuration
//! - `ragcheck dataset` - Register the labeled examples as a dataset
//! - `ragcheck ingest` - Crawl and chunk the documentation site
//! - `ragcheck ask <question>` - Stream one answer through the RAG chain
//! - `ragcheck eval` - Run the full evaluation workflow

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use futures::StreamExt;
use owo_colors::OwoColorize;
use ragcheck::{
    chain::{AnswerGenerator, PromptVariant, RagChain},
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        Cli, Commands,
    },
    dataset::{default_examples, load_examples, DatasetBuilder},
    db::InMemoryVectorStore,
    eval::{compare, save_reports, EvaluationRunner, QaEvaluator},
    ingest::CorpusIngestor,
    llm::{LLMClient, LLMClientFactory},
    rag::{create_embedding_client, Retriever},
    tracking::{create_tracker, RunCreate, RunUpdate, TrackingClient},
    types::{Example, Source},
    utils::toml_config::{IngestConfig, RagcheckConfig},
};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Commands::Init {
        path,
        force,
        provider,
    } = &cli.command
    {
        let result = init::run(
            InitConfig {
                path: path.clone(),
                force: *force,
                provider: provider.clone(),
            },
            &output,
        );
        return match result {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => Err(anyhow::anyhow!(e)),
        };
    }

    let config = RagcheckConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_tracing(&config, cli.verbose);
    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "Configuration file not found, using defaults");
    }

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config { validate } => run_config(&config, &cli.config, validate, &output),
        Commands::Dataset { examples } => run_dataset(&config, examples, &output).await,
        Commands::Ingest { root_url } => run_ingest(&config, root_url, &output).await,
        Commands::Ask {
            question,
            variant,
            root_url,
        } => run_ask(&config, &question, &variant, root_url, &output).await,
        Commands::Eval {
            variants,
            output: report_path,
            examples,
            root_url,
            concurrency,
        } => {
            run_eval(
                config,
                EvalArgs {
                    variants,
                    report_path,
                    examples,
                    root_url,
                    concurrency,
                },
                &output,
            )
            .await
        }
    }
}

/// RUST_LOG wins, then the configured level; `--verbose` forces debug for this crate.
fn init_tracing(config: &RagcheckConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(format!("{},ragcheck=debug", config.logging.level))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_config(
    config: &RagcheckConfig,
    path: &Path,
    validate: bool,
    output: &Output,
) -> anyhow::Result<()> {
    output.header("Configuration");
    output.kv("file", &path.display().to_string());
    output.kv("tracking", &config.tracking_endpoint());
    output.kv(
        "generator",
        &format!(
            "{} ({})",
            config.models.generator.model, config.models.generator.provider
        ),
    );
    output.kv(
        "grader",
        &format!(
            "{} ({})",
            config.models.grader.model, config.models.grader.provider
        ),
    );
    output.kv("embeddings", &config.embeddings.model);
    output.newline();
    println!("{}", config.to_toml()?);

    if validate {
        config.validate()?;
        config.validate_env()?;
        output.success("Configuration is valid");
    }
    Ok(())
}

async fn run_dataset(
    config: &RagcheckConfig,
    examples: Option<PathBuf>,
    output: &Output,
) -> anyhow::Result<()> {
    let examples = resolve_examples(config, examples.as_deref())?;
    let tracker = create_tracker(config)?;
    let dataset = DatasetBuilder::new(tracker)
        .with_prefix(&config.tracking.dataset_prefix)
        .build(&examples)
        .await?;

    output.success(&format!(
        "Created dataset '{}' with {} examples",
        dataset.name,
        dataset.len()
    ));
    output.kv("id", &dataset.id);
    Ok(())
}

async fn run_ingest(
    config: &RagcheckConfig,
    root_url: Option<String>,
    output: &Output,
) -> anyhow::Result<()> {
    let ingest = ingest_config(config, root_url);
    output.info(&format!("Crawling {}", ingest.root_url));

    let corpus = CorpusIngestor::from_config(&ingest)?
        .ingest(&ingest.root_url)
        .await?;

    output.success(&format!(
        "{} pages, {} chunks",
        corpus.documents.len(),
        corpus.chunks.len()
    ));
    for document in &corpus.documents {
        output.list_item(&format!(
            "{} {}",
            document.source,
            document.title.as_deref().unwrap_or_default()
        ));
    }
    Ok(())
}

async fn run_ask(
    config: &RagcheckConfig,
    question: &str,
    variant: &str,
    root_url: Option<String>,
    output: &Output,
) -> anyhow::Result<()> {
    let variant: PromptVariant = variant.parse()?;
    let retriever = build_retriever(config, root_url, output).await?;
    let llm: Arc<dyn LLMClient> = Arc::from(
        LLMClientFactory::from_config(config)
            .create_client(&config.models.generator)
            .await?,
    );
    let chain = RagChain::new(retriever, AnswerGenerator::new(llm, variant));

    let start_time = Utc::now();
    let (results, mut stream) = chain.stream(question).await?;
    output.newline();
    let mut answer = String::new();
    while let Some(delta) = stream.next().await {
        let delta = delta?;
        output.delta(&delta);
        answer.push_str(&delta);
    }
    output.newline();

    output.subheader("Sources");
    for source in results.iter().map(Source::from) {
        output.list_item(&format!(
            "{} #{} ({:.3})",
            source.url, source.chunk_index, source.relevance_score
        ));
    }

    if let Some(project) = config.tracking_project() {
        let tracker = create_tracker(config)?;
        log_ask_run(tracker.as_ref(), &project, question, &answer, start_time).await?;
        output.info(&format!("Logged run to project '{}'", project));
    }
    Ok(())
}

/// Record an ad-hoc answer as a single finished run
async fn log_ask_run(
    tracker: &dyn TrackingClient,
    project: &str,
    question: &str,
    answer: &str,
    start_time: chrono::DateTime<Utc>,
) -> ragcheck::Result<()> {
    let run_id = Uuid::new_v4();
    tracker
        .create_run(&RunCreate {
            id: run_id,
            name: "RetrievalQA".to_string(),
            run_type: "chain".to_string(),
            inputs: json!({ "question": question }),
            start_time,
            session_name: project.to_string(),
            reference_example_id: None,
        })
        .await?;
    tracker
        .update_run(
            run_id,
            &RunUpdate {
                outputs: Some(json!({ "answer": answer })),
                end_time: Utc::now(),
                error: None,
            },
        )
        .await
}

struct EvalArgs {
    variants: Vec<String>,
    report_path: Option<PathBuf>,
    examples: Option<PathBuf>,
    root_url: Option<String>,
    concurrency: Option<usize>,
}

async fn run_eval(
    mut config: RagcheckConfig,
    args: EvalArgs,
    output: &Output,
) -> anyhow::Result<()> {
    if !args.variants.is_empty() {
        config.evaluation.variants = args.variants;
    }
    if let Some(concurrency) = args.concurrency {
        config.evaluation.max_concurrency = concurrency;
    }
    config.validate()?;
    config.validate_env()?;
    let variants = config.prompt_variants()?;
    let examples = resolve_examples(&config, args.examples.as_deref())?;

    output.banner();
    let total = 3 + variants.len() as u32;

    output.step(1, total, "Creating dataset");
    let tracker = create_tracker(&config)?;
    let dataset = DatasetBuilder::new(tracker.clone())
        .with_prefix(&config.tracking.dataset_prefix)
        .build(&examples)
        .await?;
    output.kv("dataset", &dataset.name);

    output.step(2, total, "Ingesting and indexing corpus");
    let retriever = build_retriever(&config, args.root_url, output).await?;

    output.step(3, total, "Connecting to models");
    let factory = LLMClientFactory::from_config(&config);
    let generator: Arc<dyn LLMClient> =
        Arc::from(factory.create_client(&config.models.generator).await?);
    let grader: Arc<dyn LLMClient> =
        Arc::from(factory.create_client(&config.models.grader).await?);
    let evaluator =
        Arc::new(QaEvaluator::new(grader).with_feedback_key(&config.evaluation.feedback_key));

    let runner = EvaluationRunner::new(retriever, generator, evaluator, tracker)
        .with_max_concurrency(config.evaluation.max_concurrency);

    let mut reports = Vec::with_capacity(variants.len());
    for (i, variant) in variants.iter().enumerate() {
        output.step(4 + i as u32, total, &format!("Evaluating '{}'", variant));
        let report = runner.run(&dataset, *variant).await?;
        output.report(&report);
        reports.push(report);
    }

    if let Some((baseline, candidates)) = reports.split_first() {
        for candidate in candidates {
            output.comparison(&compare(baseline, candidate));
        }
    }

    if let Some(path) = &args.report_path {
        save_reports(&reports, path)?;
        output.file("report", &path.display().to_string(), None);
    }

    output.complete("Evaluation finished");
    Ok(())
}

fn resolve_examples(
    config: &RagcheckConfig,
    override_path: Option<&Path>,
) -> anyhow::Result<Vec<Example>> {
    match override_path.or(config.evaluation.examples_file.as_deref()) {
        Some(path) => Ok(load_examples(path)?),
        None => Ok(default_examples()),
    }
}

fn ingest_config(config: &RagcheckConfig, root_url: Option<String>) -> IngestConfig {
    let mut ingest = config.ingest.clone();
    if let Some(root_url) = root_url {
        ingest.root_url = root_url;
    }
    ingest
}

/// Crawl, chunk and index the corpus into a fresh in-memory store
async fn build_retriever(
    config: &RagcheckConfig,
    root_url: Option<String>,
    output: &Output,
) -> anyhow::Result<Arc<Retriever>> {
    let ingest = ingest_config(config, root_url);
    let corpus = CorpusIngestor::from_config(&ingest)?
        .ingest(&ingest.root_url)
        .await?;
    if corpus.chunks.is_empty() {
        anyhow::bail!("No content ingested from {}", ingest.root_url);
    }

    let retriever = Retriever::new(
        create_embedding_client(config)?,
        Arc::new(InMemoryVectorStore::new()),
        config.retrieval.k,
    )
    .with_batch_size(config.embeddings.batch_size);
    let indexed = retriever.index(&corpus.chunks).await?;

    info!(pages = corpus.documents.len(), chunks = indexed, "Corpus ready");
    output.kv(
        "corpus",
        &format!("{} pages, {} chunks", corpus.documents.len(), indexed),
    );
    Ok(Arc::new(retriever))
}
