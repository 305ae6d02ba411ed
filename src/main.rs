use clap::{Parser, Subcommand};
use image_jobs::config::{self, JobsConfig};
use image_jobs::envelope::NotificationEnvelope;
use image_jobs::handler::{Handler, InvocationContext};
use image_jobs::output;
use image_jobs::store::FsStore;
use image_jobs::transform::Job;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "image-jobs")]
#[command(about = "Event-driven image processing jobs")]
#[command(long_about = "\
Event-driven image processing jobs

Each run reads one notification envelope (a batch of storage put events),
applies a job to every referenced object, writes derived artifacts back to
the same bucket and prints a summary.

Jobs and their outputs (stem = file name without extension):

  exif              processed/exif/<stem>.json
  greyscale         processed/greyscale/<stem>.jpg
  resize            processed/resized/<stem>.jpg        (fits 1024x1024)
  resize-pipeline   processed/resized/<stem>.jpg
                    processed/grayscale/<stem>.jpg
                    processed/metadata/<stem>.json

Buckets are directories under the store root: bucket \"photos\", key
\"images/cat.jpg\" is <root>/photos/images/cat.jpg.

The summary {\"statusCode\", \"processed\", \"failed\"} goes to stdout; the
per-object report and logs go to stderr. A 207 status means some objects
failed; the process still exits 0.

Run 'image-jobs gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (TOML). Stock defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store root directory, overriding `store.root` from the config
    #[arg(long, global = true)]
    store_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a job over one notification envelope
    Run {
        /// Which transform to apply
        #[arg(value_enum)]
        job: Job,

        /// Envelope JSON file, or `-` for stdin
        #[arg(long, default_value = "-")]
        event: PathBuf,

        /// Request id recorded in logs
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            job,
            event,
            request_id,
        } => {
            let mut jobs_config = config::load_config(cli.config.as_deref())?;
            if let Some(root) = cli.store_root {
                jobs_config.store.root = root;
            }
            init_tracing(&jobs_config)?;

            let envelope = read_envelope(&event)?;
            let context = InvocationContext::new(request_id.unwrap_or_else(local_request_id));

            let store = FsStore::new(&jobs_config.store.root);
            let handler = Handler::new(store, job, jobs_config.process_options());
            let invocation = handler.handle(&envelope, &context);

            output::print_report(job, &invocation.report, &invocation.summary);
            println!("{}", serde_json::to_string(&invocation.summary)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(jobs_config: &JobsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let level = jobs_config.logging.level_filter()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn read_envelope(path: &Path) -> Result<NotificationEnvelope, Box<dyn std::error::Error>> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}

fn local_request_id() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("local-{}-{}", std::process::id(), secs)
}
