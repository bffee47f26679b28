use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tipcard::assets::AssetSelector;
use tipcard::config::{self, EnvSecrets};
use tipcard::http::{HttpClient, ReqwestClient};
use tipcard::pipeline::Pipeline;
use tipcard::tip::OpenAiTipSource;
use tipcard::{output, publish};
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that render an image.
#[derive(clap::Args, Clone)]
struct RenderArgs {
    /// Use this text instead of asking the tip service
    #[arg(long)]
    tip: Option<String>,

    /// Seed for background and font selection
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser)]
#[command(name = "tipcard")]
#[command(about = "Render a short tip onto an image and post it everywhere")]
#[command(long_about = "\
Render a short tip onto an image and post it everywhere

Each run asks the tip service for one tip, picks a random background and
font, wraps and centers the text on a square canvas, and posts the image with
the tip as its caption to every configured platform. A failure on one
platform never stops the others.

Asset layout:

  backgrounds/        # jpg, jpeg, png, tif, tiff, webp
  fonts/              # ttf, otf
  tipcard.toml        # optional, see 'tipcard gen-config'

Credentials are read from environment variables named in the config:
  OPENAI_API_KEY, TWITTER_ACCESS_TOKEN, BLUESKY_EMAIL, BLUESKY_PASSWORD,
  THREADS_USER_ID, THREADS_ACCESS_TOKEN

Set RUST_LOG (e.g. RUST_LOG=tipcard=debug) to adjust logging.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "tipcard.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate, render and publish one tip
    Run {
        #[command(flatten)]
        render: RenderArgs,

        /// Keep the rendered image after publishing
        #[arg(long)]
        retain: bool,
    },
    /// Render one tip to a file without publishing
    Preview {
        #[command(flatten)]
        render: RenderArgs,

        /// Where to write the image
        #[arg(long, default_value = "preview.jpg")]
        output: PathBuf,
    },
    /// Validate config, asset pools and credentials without posting
    Check,
    /// Print a stock tipcard.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run { render, retain } => {
            let mut config = config::load_config(&cli.config)?;
            config.artifact.retain |= retain;
            init_thread_pool(config.publish.platforms.len());

            let pipeline = Pipeline::from_config(config, render.tip, &EnvSecrets)?;
            let summary = pipeline.run(&mut rng(render.seed))?;
            output::print_run_summary(&summary);
        }
        Command::Preview {
            render,
            output: path,
        } => {
            let config = config::load_config(&cli.config)?;
            let pipeline = Pipeline::from_config(config, render.tip, &EnvSecrets)?;
            let tip = pipeline.generate_tip()?;
            let rendered = pipeline.render(&tip, &mut rng(render.seed), Some(path.as_path()))?;
            output::print_preview(&tip, &rendered);
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            println!("==> Checking {}", cli.config.display());
            let selector = AssetSelector::from_config(&config.assets, config.text.font_size)?;
            let http: Arc<dyn HttpClient> = Arc::new(ReqwestClient::with_timeout(
                Duration::from_secs(config.publish.timeout_secs),
            )?);
            if let Err(e) = OpenAiTipSource::from_config(&config.tip, &EnvSecrets, http.clone()) {
                tracing::warn!(error = %e, "tip service unavailable; only --tip runs will work");
            }
            let platforms = publish::build_platforms(&config.publish, &EnvSecrets, http);
            output::print_check(&selector, &platforms);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for the run summary.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tipcard=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Size the rayon pool to the platform count; fan-out is the only parallel work.
fn init_thread_pool(platforms: usize) {
    rayon::ThreadPoolBuilder::new()
        .num_threads(platforms.max(1))
        .build_global()
        .ok();
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
