//! routesearch CLI - run search tasks from the command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use routesearch_core::{compute_pagination, RouteMatch, RouteTask};
use routesearch_engine::{SearchTask, TemplateRenderer, STATUS_NOT_FOUND};

/// Exit code for a task that failed with the no-results rule.
const EXIT_NO_RESULTS: i32 = 4;

/// Exit code for any other task failure.
const EXIT_FAILED: i32 = 1;

/// routesearch CLI - Search task runner
#[derive(Parser)]
#[command(name = "routesearch")]
#[command(about = "Render and run templated search tasks", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a task against its search engine
    Run {
        /// Path to the task JSON
        #[arg(short, long)]
        task: PathBuf,

        /// Route context as inline JSON, or @path to a JSON file
        #[arg(short, long, default_value = "{}")]
        context: String,
    },

    /// Print pagination metadata for a result set
    Paginate {
        /// Offset of the first result
        #[arg(long, default_value_t = 0)]
        from: u64,

        /// Page size
        #[arg(long, default_value_t = 10)]
        size: u64,

        /// Total number of results
        #[arg(long)]
        total: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run { task, context } => {
            run_task(&task, &context).await?;
        }
        Commands::Paginate { from, size, total } => {
            paginate(from, size, total)?;
        }
    }

    Ok(())
}

async fn run_task(task_path: &Path, context: &str) -> Result<(), Box<dyn std::error::Error>> {
    let task = RouteTask::from_json(&std::fs::read_to_string(task_path)?)?;
    let route = load_context(context)?;

    info!(task = %task_path.display(), "Loaded task");

    let executor = SearchTask::http(Arc::new(TemplateRenderer::default()));

    match executor.execute(&route, &task).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err.report())?);
            let code = if err.status_code == STATUS_NOT_FOUND {
                EXIT_NO_RESULTS
            } else {
                EXIT_FAILED
            };
            std::process::exit(code);
        }
    }
}

fn paginate(from: u64, size: u64, total: u64) -> Result<(), Box<dyn std::error::Error>> {
    if size == 0 {
        return Err("page size must be at least 1".into());
    }

    let pagination = compute_pagination(from, size, total);
    println!("{}", serde_json::to_string_pretty(&pagination)?);

    Ok(())
}

/// Parse the route context argument.
fn load_context(arg: &str) -> Result<RouteMatch, Box<dyn std::error::Error>> {
    let json = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => arg.to_string(),
    };
    Ok(RouteMatch::new(serde_json::from_str(&json)?))
}
