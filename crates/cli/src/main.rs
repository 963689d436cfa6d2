mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use printlab_compositor::{Compositor, DefaultAssetLoader, TextRenderer};
use printlab_core::{group_by_placement, MockupFormat};
use printlab_pipeline::{MergeFailurePolicy, MergeOrchestrator, MockupJob, MockupPipeline};
use printlab_printful::{spawn_poll, CatalogSource, PrintfulApi};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "printlab", version, about = "Design compositing and mockup generation")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge placements, submit a mockup task and wait for the result.
    Generate(GenerateArgs),
    /// Composite multi-design placements into local PNG files.
    Compose(ComposeArgs),
    /// Wait for an already submitted mockup task.
    Status(StatusArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Mockup job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override the job's output format (jpg or png).
    #[arg(long)]
    format: Option<MockupFormat>,

    /// Keep the latest design when a placement cannot be merged.
    #[arg(long, default_value_t = false)]
    merge_fallback: bool,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Mockup job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the composites are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct StatusArgs {
    /// Task key returned by the create-task call.
    task_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "printlab=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;
    let api = Arc::new(PrintfulApi::new(&config.client).context("failed to build HTTP client")?);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling");
                cancel.cancel();
            }
        }
    });

    match cli.cmd {
        Command::Generate(args) => cmd_generate(args, &config, api, &cancel).await,
        Command::Compose(args) => cmd_compose(args, &config, api, &cancel).await,
        Command::Status(args) => cmd_status(args, &config, api, &cancel).await,
    }
}

async fn cmd_generate(
    args: GenerateArgs,
    config: &AppConfig,
    api: Arc<PrintfulApi>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let mut job = read_job(&args.in_path)?;
    if let Some(format) = args.format {
        job.format = format;
    }

    let policy = if args.merge_fallback {
        MergeFailurePolicy::FallbackToLatest
    } else {
        config.merge_policy
    };
    let merger = MergeOrchestrator::new(compositor(config)?, api.clone(), policy);
    let pipeline = MockupPipeline::new(merger, api, config.client.poll);

    let outcome = pipeline.generate(&job, cancel).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn cmd_compose(
    args: ComposeArgs,
    config: &AppConfig,
    api: Arc<PrintfulApi>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let job = read_job(&args.in_path)?;
    let catalog = match job.catalog {
        Some(catalog) => catalog,
        None => api
            .catalog(job.product_id)
            .await
            .with_context(|| format!("failed to load print files for product {}", job.product_id))?,
    };

    let compositor = compositor(config)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    for group in group_by_placement(&job.files) {
        if !group.needs_merge() {
            tracing::info!(placement = %group.placement, "Single design, nothing to composite");
            continue;
        }
        let area = catalog.require_print_area(&group.placement)?;
        let composite = compositor
            .compose(&group.placement, &group.files, area, cancel)
            .await?;
        let path = args.out_dir.join(&composite.filename);
        std::fs::write(&path, &composite.png)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("{}", path.display());
    }
    Ok(())
}

async fn cmd_status(
    args: StatusArgs,
    config: &AppConfig,
    api: Arc<PrintfulApi>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let handle = spawn_poll(api, args.task_key, config.client.poll, cancel);
    let url = handle.wait().await?;
    println!("{url}");
    Ok(())
}

fn read_job(path: &Path) -> anyhow::Result<MockupJob> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid mockup job in {}", path.display()))
}

fn compositor(config: &AppConfig) -> anyhow::Result<Arc<Compositor>> {
    let loader = Arc::new(DefaultAssetLoader::new()?);
    let text = match TextRenderer::load(config.font_path.as_deref()) {
        Ok(renderer) => Some(Arc::new(renderer)),
        Err(e) => {
            tracing::warn!(error = %e, "No usable font, text designs cannot be composited");
            None
        }
    };
    Ok(Arc::new(Compositor::new(loader, text)))
}
