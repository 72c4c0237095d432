//! omts-import CLI: turn a workbook dump into a validated graph document.
//!
//! Usage:
//!   omts-import import <workbook.json|yaml> [--config file] [--salt hex] [--scope s]
//!   omts-import check <workbook.json|yaml> [--config file] [--scope s]

use clap::{Parser, Subcommand};
use omts_import::{
    DisclosureScope, FileSalt, GraphDocument, ImportConfig, ImportOptions, ImportPipeline,
    PipelineError, WorkbookFile,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "omts-import",
    version,
    about = "Import supply-chain disclosure workbooks into a validated graph"
)]
struct Cli {
    /// Log more detail (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a workbook and print the graph document as JSON
    Import {
        /// Workbook dump (.json, .yaml or .yml)
        workbook: PathBuf,
        #[command(flatten)]
        settings: Settings,
        /// Fixed file salt (64 hex characters) for reproducible IDs
        #[arg(long)]
        salt: Option<String>,
    },
    /// Import a workbook and print only its diagnostics
    Check {
        /// Workbook dump (.json, .yaml or .yml)
        workbook: PathBuf,
        #[command(flatten)]
        settings: Settings,
    },
}

#[derive(clap::Args)]
struct Settings {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Validate under this disclosure scope if stricter than the workbook's
    #[arg(long)]
    scope: Option<DisclosureScope>,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_options(settings: &Settings, salt: Option<&str>) -> Result<ImportOptions, String> {
    let config = match &settings.config {
        Some(path) => ImportConfig::load(path)
            .map_err(|e| format!("Failed to load config {}: {}", path.display(), e))?,
        None => ImportConfig::default(),
    };
    let mut options = config.into_options().map_err(|e| e.to_string())?;
    if let Some(hex) = salt {
        let salt = FileSalt::from_hex(hex).map_err(|e| format!("invalid --salt: {}", e))?;
        options = options.with_salt(salt);
    }
    if let Some(scope) = settings.scope {
        options = options.with_scope_override(scope);
    }
    Ok(options)
}

async fn run_import(workbook: &Path, options: ImportOptions) -> Result<GraphDocument, PipelineError> {
    let source = WorkbookFile::open(workbook);
    ImportPipeline::new(options).run(&source).await
}

fn print_diagnostics(doc: &GraphDocument) {
    let report = doc.diagnostics();
    for diagnostic in report {
        eprintln!("{}", diagnostic);
    }
    eprintln!(
        "{} nodes, {} edges, {} errors, {} warnings",
        doc.nodes().len(),
        doc.edges().len(),
        report.error_count(),
        report.warning_count()
    );
}

async fn cmd_import(workbook: &Path, settings: &Settings, salt: Option<&str>) -> i32 {
    let options = match build_options(settings, salt) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let doc = match run_import(workbook, options).await {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match doc.to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: failed to render document: {}", e);
            return 1;
        }
    }
    print_diagnostics(&doc);
    0
}

async fn cmd_check(workbook: &Path, settings: &Settings) -> i32 {
    let options = match build_options(settings, None) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match run_import(workbook, options).await {
        Ok(doc) => {
            print_diagnostics(&doc);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Import {
            workbook,
            settings,
            salt,
        } => cmd_import(&workbook, &settings, salt.as_deref()).await,
        Commands::Check { workbook, settings } => cmd_check(&workbook, &settings).await,
    };
    std::process::exit(code);
}
