use clap::Parser;
use latentdist_batch::BatchConfig;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Batch W+ latent distances between participants, strangers and friends
#[derive(Parser, Debug)]
#[command(name = "latentdist")]
#[command(
    about = "Compute participant-stranger and participant-friend latent distances",
    long_about = None
)]
struct Args {
    /// Participant table (.csv or .xlsx) with name, sex and optional fname columns
    #[arg(short, long, default_value = "source.csv")]
    input: PathBuf,

    /// Output table, written as .xlsx or CSV by extension
    #[arg(short, long, default_value = "source_with_distances.csv")]
    output: PathBuf,

    /// Directory holding participant latents
    #[arg(long, default_value = "ptraw")]
    latent_dir: PathBuf,

    /// Directory holding fu1/fu2/mu1/mu2 stranger latents
    #[arg(long, default_value = ".")]
    reference_dir: PathBuf,

    /// File name suffix between identifier and extension
    #[arg(long, default_value = "_01_latent")]
    suffix: String,

    /// Extensions tried in order
    #[arg(long, value_delimiter = ',', default_value = "pt,npy")]
    extensions: Vec<String>,

    /// Mapping key holding the latent in dict-shaped tensor archives
    #[arg(long)]
    latent_key: Option<String>,

    /// Write summary statistics as JSON to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for BatchConfig {
    fn from(args: Args) -> Self {
        Self {
            input: args.input,
            output: args.output,
            latent_dir: args.latent_dir,
            reference_dir: args.reference_dir,
            suffix: args.suffix,
            extensions: args.extensions,
            latent_key: args.latent_key,
            summary: args.summary,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting latentdist v{}", env!("CARGO_PKG_VERSION"));

    let config = BatchConfig::from(args);
    info!("Input table: {:?}", config.input);
    info!("Latent directory: {:?}", config.latent_dir);
    info!("Reference directory: {:?}", config.reference_dir);

    let report = latentdist_batch::run(&config)?;

    for line in report.to_string().lines() {
        info!("{}", line);
    }
    Ok(())
}
