mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use triage_ai::{Embed, HashEmbedder};
use triage_core::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_VECTOR_DB_BASE_PATH};
use triage_core::{Category, RagConfig, TextSplitter};
use triage_llm::http::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use triage_llm::{ClientConfig, CompletionClient};
use triage_store::{IpcStore, SegmentStore};
use triage_workflow::{Index, VectorIndex, Workflow};

#[derive(Parser)]
#[command(name = "triage", version, about = "Classify, index and answer support tickets")]
struct Cli {
    /// Vector store backend
    #[arg(long, global = true, value_enum, default_value_t = Backend::Ipc)]
    backend: Backend,

    /// Root directory holding one vector store per category
    #[arg(long, global = true, env = "TRIAGE_STORE_DIR", default_value = DEFAULT_VECTOR_DB_BASE_PATH)]
    store_dir: PathBuf,

    /// all-MiniLM-L6-v2 model directory (model.onnx + tokenizer.json);
    /// hashed term vectors are used when unset
    #[arg(long, global = true, env = "TRIAGE_EMBED_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a new ticket through the workflow
    Process {
        #[arg(long)]
        subject: String,

        #[arg(long)]
        description: String,

        /// Print the final record as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        chunking: ChunkArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Query one category's store for similar segments
    Search {
        #[arg(long)]
        category: Category,

        #[arg(long)]
        query: String,

        #[arg(short, default_value_t = 3)]
        k: usize,
    },
    /// Segment counts per category
    Stats,
}

#[derive(Args)]
struct ChunkArgs {
    #[arg(long, env = "TRIAGE_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    #[arg(long, env = "TRIAGE_CHUNK_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,
}

#[derive(Args)]
struct LlmArgs {
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: String,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "TRIAGE_LLM_URL", default_value = DEFAULT_BASE_URL)]
    llm_url: String,

    #[arg(long, env = "TRIAGE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    /// Arrow IPC files with brute-force cosine search
    Ipc,
    /// LanceDB tables (requires the `lancedb` feature)
    Lance,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    tracing::debug!("triage v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(cli.backend, &cli.store_dir)?;

    match cli.command {
        Command::Process {
            subject,
            description,
            json,
            chunking,
            llm,
        } => {
            let config = RagConfig {
                vector_db_base_path: cli.store_dir.clone(),
                chunk_size: chunking.chunk_size,
                chunk_overlap: chunking.chunk_overlap,
            };
            let splitter = TextSplitter::from_config(&config)?;
            let completer = CompletionClient::new(ClientConfig {
                base_url: llm.llm_url,
                model: llm.model,
                api_key: llm.api_key,
                timeout: Duration::from_secs(llm.timeout_secs),
            })?;
            let index = VectorIndex::new(store, load_embedder(cli.model_dir.as_deref())?);

            let workflow = Workflow::new(Arc::new(completer), Arc::new(index), splitter);
            let record = workflow.process_ticket(subject, description).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                display::print_ticket_card(&record);
            }
        }
        Command::Search { category, query, k } => {
            let index = VectorIndex::new(store, load_embedder(cli.model_dir.as_deref())?);
            let hits = index.query(category, &query, k).await;
            display::print_search_results(category, &hits);
        }
        Command::Stats => {
            let mut counts = Vec::with_capacity(Category::ALL.len());
            for category in Category::ALL {
                counts.push((category, store.count(category).await?));
            }
            display::print_stats(&cli.store_dir, &counts);
        }
    }

    Ok(())
}

fn open_store(backend: Backend, dir: &Path) -> anyhow::Result<Arc<dyn SegmentStore>> {
    match backend {
        Backend::Ipc => Ok(Arc::new(IpcStore::open(dir))),
        #[cfg(feature = "lancedb")]
        Backend::Lance => Ok(Arc::new(triage_store::LanceStore::open(dir))),
        #[cfg(not(feature = "lancedb"))]
        Backend::Lance => anyhow::bail!("the lance backend needs a build with `--features lancedb`"),
    }
}

fn load_embedder(model_dir: Option<&Path>) -> anyhow::Result<Box<dyn Embed>> {
    match model_dir {
        None => Ok(Box::new(HashEmbedder::default())),
        #[cfg(feature = "onnx")]
        Some(dir) => Ok(Box::new(triage_ai::Embedder::load(dir)?)),
        #[cfg(not(feature = "onnx"))]
        Some(dir) => anyhow::bail!(
            "cannot load embedding model from {}: built without `--features onnx`",
            dir.display()
        ),
    }
}
