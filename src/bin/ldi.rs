//! ldi CLI: adapt payloads and materialise them into a quad store.
//!
//! Usage:
//!   ldi adapt --config pipeline.yaml [--mime type] <file>
//!   ldi run --config pipeline.yaml [--mime type] <files...>
//!   ldi dump --config pipeline.yaml

use clap::{Parser, Subcommand};
use ldi::adapter::Adapter;
use ldi::{
    Content, GraphScope, Pipeline, PipelineConfig, Repository, RepositoryConnection,
    RepositoryManager, SqliteRepositoryManager,
};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "ldi",
    version,
    about = "Linked-data ingestion: adapt payloads and materialise them"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the graphs the configured adapter produces for a file
    Adapt {
        /// Pipeline description (YAML)
        #[arg(long)]
        config: PathBuf,
        /// MIME type of the input (defaults to the configured one)
        #[arg(long)]
        mime: Option<String>,
        /// Input payload
        file: PathBuf,
    },
    /// Run the whole pipeline over one or more files
    Run {
        /// Pipeline description (YAML)
        #[arg(long)]
        config: PathBuf,
        /// MIME type of the inputs (defaults to the configured one)
        #[arg(long)]
        mime: Option<String>,
        /// Input payloads, processed in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print every statement in the configured repository as N-Quads
    Dump {
        /// Pipeline description (YAML)
        #[arg(long)]
        config: PathBuf,
    },
}

/// Get the default repository endpoint (~/.local/share/ldi)
fn default_endpoint() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("ldi")
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

/// Load a description, filling in the default endpoint.
fn load_config(path: &Path) -> Result<(PipelineConfig, PathBuf), String> {
    let mut config = PipelineConfig::load(path).map_err(|e| e.to_string())?;
    if config.materialiser.endpoint.is_none() {
        config.materialiser.endpoint = Some(default_endpoint());
    }
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok((config, base_dir))
}

fn read_content(path: &Path, mime: &str) -> Result<Content, String> {
    let payload = std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read {}: {}", path.display(), e))?;
    Ok(Content::new(payload, mime))
}

fn mime_type(flag: Option<String>, config: &PipelineConfig, adapter: &dyn Adapter) -> String {
    flag.or_else(|| config.mime_type.clone())
        .unwrap_or_else(|| adapter.supported_mime_type().to_string())
}

fn exit_code(result: Result<(), String>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_adapt(config_path: &Path, mime: Option<String>, file: &Path) -> i32 {
    let result = (|| {
        let (config, base_dir) = load_config(config_path)?;
        let pipeline = Pipeline::from_config(&config, &base_dir).map_err(|e| e.to_string())?;
        let mime = mime_type(mime, &config, pipeline.adapter());
        let content = read_content(file, &mime)?;
        let graphs = pipeline.adapter().apply(&content).map_err(|e| e.to_string())?;
        for (i, graph) in graphs.enumerate() {
            let graph = graph.map_err(|e| e.to_string())?;
            println!("# graph {} ({} triples)", i, graph.len());
            print!("{}", graph);
        }
        Ok::<(), String>(())
    })();
    exit_code(result)
}

fn cmd_run(config_path: &Path, mime: Option<String>, files: &[PathBuf]) -> i32 {
    let result = (|| {
        let (config, base_dir) = load_config(config_path)?;
        let pipeline = Pipeline::from_config(&config, &base_dir).map_err(|e| e.to_string())?;
        let mime = mime_type(mime, &config, pipeline.adapter());
        let contents = files
            .iter()
            .map(|file| read_content(file, &mime))
            .collect::<Result<Vec<_>, _>>()?;
        let report = pipeline.run(contents).map_err(|e| e.to_string())?;
        println!(
            "Materialised {} member(s) into '{}'",
            report.members,
            pipeline.materialiser().repository_id()
        );
        Ok::<(), String>(())
    })();
    exit_code(result)
}

fn cmd_dump(config_path: &Path) -> i32 {
    let result = (|| {
        let (config, base_dir) = load_config(config_path)?;
        let endpoint = base_dir.join(config.materialiser.endpoint.unwrap_or_else(default_endpoint));
        let manager = SqliteRepositoryManager::open(&endpoint).map_err(|e| e.to_string())?;
        let repository = manager
            .repository(&config.materialiser.repository_id)
            .map_err(|e| e.to_string())?;
        let connection = repository.connection().map_err(|e| e.to_string())?;
        let quads = connection
            .get_statements(None, None, None, &GraphScope::All)
            .map_err(|e| e.to_string())?;
        for quad in quads {
            println!("{} .", quad);
        }
        Ok::<(), String>(())
    })();
    exit_code(result)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let code = match cli.command {
        Commands::Adapt { config, mime, file } => cmd_adapt(&config, mime, &file),
        Commands::Run {
            config,
            mime,
            files,
        } => cmd_run(&config, mime, &files),
        Commands::Dump { config } => cmd_dump(&config),
    };
    std::process::exit(code);
}
