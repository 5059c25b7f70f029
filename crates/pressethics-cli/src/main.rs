mod display;
mod embed;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pressethics_ai::Embedder;
use pressethics_core::config::{
    DEFAULT_EMBED_MODEL_DIR, DEFAULT_GEMINI_BASE_URL, DEFAULT_INDEX_PATH, DEFAULT_MAX_ARTICLE_CHARS,
    DEFAULT_MAX_IMAGES, DEFAULT_MODEL, DEFAULT_TOP_K,
};
use pressethics_core::{ClauseId, ImagePolicy, PipelineConfig, cases};
use pressethics_pipeline::{CaseRetriever, IndexRetriever, Pipeline};
use pressethics_store::CaseIndex;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Review Korean news articles against the press ethics code.
#[derive(Parser, Debug)]
#[command(name = "pressethics", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    index: IndexArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch an article and draft a reviewed ethics verdict.
    Analyze(AnalyzeArgs),
    /// Show the prior rulings most similar to a text.
    Search {
        text: String,
        #[arg(short, long, env = "PRESSETHICS_TOP_K", default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },
    /// Print the 16-clause code, or one clause.
    Clauses { number: Option<u8> },
    /// Build or inspect the case index.
    #[command(subcommand)]
    Index(IndexCommand),
}

#[derive(Subcommand, Debug)]
enum IndexCommand {
    /// Embed a Parquet file of prior rulings and replace the index table.
    Build { parquet: PathBuf },
    /// Table names and row count.
    Stats,
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// LanceDB directory.
    #[arg(long, global = true, env = "PRESSETHICS_INDEX", default_value = DEFAULT_INDEX_PATH)]
    index_path: PathBuf,
    #[arg(long, global = true, env = "PRESSETHICS_TABLE", default_value = cases::DEFAULT_TABLE)]
    table: String,
    /// Directory holding model.onnx and tokenizer.json.
    #[arg(long, global = true, env = "PRESSETHICS_EMBED_MODEL", default_value = DEFAULT_EMBED_MODEL_DIR)]
    embed_model: PathBuf,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    url: String,
    /// Print the full run report as JSON instead of the verdict card.
    #[arg(long)]
    json: bool,
    #[arg(long, env = "GEMINI_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    base_url: String,
    #[arg(short, long, env = "PRESSETHICS_TOP_K", default_value_t = DEFAULT_TOP_K)]
    k: usize,
    #[arg(long, env = "PRESSETHICS_MAX_IMAGES", default_value_t = DEFAULT_MAX_IMAGES)]
    max_images: usize,
    #[arg(long, env = "PRESSETHICS_MAX_CHARS", default_value_t = DEFAULT_MAX_ARTICLE_CHARS)]
    max_chars: usize,
    /// `skip` leaves out images that fail; `abort` stops the run.
    #[arg(long, env = "PRESSETHICS_IMAGE_POLICY", default_value_t = ImagePolicy::Skip)]
    image_policy: ImagePolicy,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig {
            index_path: self.index.index_path.clone(),
            table: self.index.table.clone(),
            embed_model_dir: self.index.embed_model.clone(),
            ..PipelineConfig::default()
        };
        match &self.command {
            Command::Analyze(args) => {
                config.model = args.model.clone();
                config.gemini_base_url = args.base_url.clone();
                config.top_k = args.k;
                config.max_images = args.max_images;
                config.max_article_chars = args.max_chars;
                config.image_policy = args.image_policy;
            }
            Command::Search { k, .. } => config.top_k = *k,
            _ => {}
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so clap's env fallbacks see it.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging();
    debug!("pressethics v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.config();
    config.validate()?;

    match cli.command {
        Command::Analyze(args) => cmd_analyze(config, args).await,
        Command::Search { text, k } => cmd_search(&config, &text, k).await,
        Command::Clauses { number } => cmd_clauses(number),
        Command::Index(IndexCommand::Build { parquet }) => cmd_index_build(&config, &parquet).await,
        Command::Index(IndexCommand::Stats) => cmd_index_stats(&config).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lance=warn,lancedb=warn,ort=warn,hyper=warn,reqwest=warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

async fn cmd_analyze(config: PipelineConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let api_key = args
        .api_key
        .filter(|k| !k.trim().is_empty())
        .context("no Gemini API key: set GEMINI_KEY (environment or .env) or pass --api-key")?;
    info!(
        model = %config.model,
        key = %display::mask_key(&api_key),
        index = %config.index_path.display(),
        "starting analysis"
    );

    let pipeline =
        Pipeline::gemini(config, &api_key)?.with_progress(Arc::new(display::StderrProgress));
    let report = pipeline
        .run(&args.url)
        .await
        .with_context(|| format!("analysing {}", args.url))?;

    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        eprintln!();
        display::print_verdict_card(&report);
    }
    Ok(())
}

async fn cmd_search(config: &PipelineConfig, text: &str, k: usize) -> anyhow::Result<()> {
    let retriever = IndexRetriever::from_config(config);
    let cases = retriever
        .retrieve(text, k)
        .await
        .context("searching the case index")?;
    display::print_cases(&cases);
    Ok(())
}

fn cmd_clauses(number: Option<u8>) -> anyhow::Result<()> {
    let only = match number {
        Some(n) => Some(
            ClauseId::new(n).with_context(|| format!("제{n}조 does not exist (1..=16)"))?,
        ),
        None => None,
    };
    display::print_clauses(only);
    Ok(())
}

async fn cmd_index_build(config: &PipelineConfig, parquet: &std::path::Path) -> anyhow::Result<()> {
    eprintln!("Loading embedding model from {}", config.embed_model_dir.display());
    let mut embedder = Embedder::load(&config.embed_model_dir).with_context(|| {
        format!(
            "loading embedder from {} (export it with: optimum-cli export onnx --model intfloat/multilingual-e5-large-instruct {})",
            config.embed_model_dir.display(),
            config.embed_model_dir.display()
        )
    })?;
    let model_name = embedder.model_name().to_string();
    let dim = embedder.dim();

    let index = CaseIndex::create(&config.index_path, &config.table)
        .await
        .context("opening case index")?;
    let stats = embed::build_index(
        &index,
        parquet,
        embed::ModelInfo {
            name: &model_name,
            dim,
        },
        |texts| Ok(embedder.embed_batch(texts)?),
    )
    .await?;

    eprintln!(
        "Indexed {} cases into {}/{} in {:.1}s",
        stats.total_rows,
        config.index_path.display(),
        config.table,
        stats.elapsed_secs
    );
    Ok(())
}

async fn cmd_index_stats(config: &PipelineConfig) -> anyhow::Result<()> {
    let index = CaseIndex::open(&config.index_path, &config.table)
        .await
        .with_context(|| format!("opening {}", config.index_path.display()))?;
    println!("Index: {}", index.path().display());
    let tables = index.table_names().await?;
    println!("Tables: {}", tables.join(", "));
    if tables.iter().any(|t| t == index.table_name()) {
        println!("{}: {} cases", index.table_name(), index.count().await?);
    } else {
        println!("{}: missing (run `pressethics index build <PARQUET>`)", index.table_name());
    }
    Ok(())
}
