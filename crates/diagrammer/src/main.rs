use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use diagrammer::{analyze_project, normalize_language, write_output};
use diagrammer_core::config::CONFIG_FILE_NAME;
use diagrammer_core::{Analysis, Config};
use diagrammer_report::{json, organize_diagrams, render_index, text, DiagramGenerator};

#[derive(Parser)]
#[command(name = "diagrammer")]
#[command(about = "Generate Mermaid architecture diagrams from a source tree")]
#[command(version)]
struct Cli {
    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a codebase and write the diagram documents
    Generate {
        /// Path to the project root
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Output directory for the diagram tree
        #[arg(short, long, default_value = "docs/architecture")]
        output: PathBuf,
        /// Languages to scan, comma separated (ts, js, py)
        #[arg(short, long, value_delimiter = ',')]
        languages: Vec<String>,
        /// Config file path (defaults to .diagrammer.toml in the project or an ancestor)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Analyze a codebase and print a summary
    Analyze {
        /// Path to the project root
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Languages to scan, comma separated (ts, js, py)
        #[arg(short, long, value_delimiter = ',')]
        languages: Vec<String>,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Create a default .diagrammer.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            path,
            output,
            languages,
            config,
        } => cmd_generate(&path, &output, &languages, config.as_deref()),
        Commands::Analyze {
            path,
            format,
            languages,
            config,
        } => cmd_analyze(&path, format, &languages, config.as_deref()),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_generate(
    path: &Path,
    output: &Path,
    languages: &[String],
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    let analysis = run_analysis(path, languages, &config)?;

    let diagrams = DiagramGenerator::new(config.diagram_settings()).generate_diagrams(&analysis);
    let organized = organize_diagrams(&diagrams);
    let today = chrono::Local::now().date_naive();
    let index = render_index(&organized, &analysis, today);
    write_output(output, &organized, &index, today)?;

    print!("{}", text::format_summary(&analysis));
    print!("{}", text::format_written(&output.display().to_string(), &organized));
    Ok(())
}

fn cmd_analyze(
    path: &Path,
    format: Format,
    languages: &[String],
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(path, config_path)?;
    let analysis = run_analysis(path, languages, &config)?;
    match format {
        Format::Text => print!("{}", text::format_summary(&analysis)),
        Format::Json => {
            let body = json::format_analysis(&analysis, false).context("failed to serialize analysis")?;
            println!("{body}");
        }
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE_NAME);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())
        .with_context(|| format!("failed to write {CONFIG_FILE_NAME}"))?;
    println!("Created {CONFIG_FILE_NAME} with default configuration.");
    Ok(())
}

fn load_config(project_path: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => Ok(Config::load_or_default(project_path)),
    }
}

fn run_analysis(project_path: &Path, languages: &[String], config: &Config) -> Result<Analysis> {
    if !project_path.is_dir() {
        anyhow::bail!("'{}' is not a directory", project_path.display());
    }
    let requested: &[String] = if languages.is_empty() {
        &config.project.languages
    } else {
        languages
    };
    let languages: Vec<String> = requested.iter().map(|l| normalize_language(l)).collect();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(analyze_project(project_path, &languages, config))
}
