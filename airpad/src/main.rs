//! airpad: phone motion in, key presses out
//!
//! Listens for JSON sensor datagrams over UDP, classifies sliding
//! windows of motion into gestures, and turns stable gestures into key
//! events. One process, three stage threads, stopped with Ctrl-C.
//!
//! Default builds deliver actions to the log; compile with `--features
//! inject` (or pass `--dry-run` to an inject build) to control which.

mod config;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use airpad_connectors::{ActionSink, LogSink, SampleSource, UdpSampleSource};
use airpad_core::constants::timing::DEFAULT_JOIN_TIMEOUT_MS;
use airpad_core::MonotonicClock;
use airpad_ml::{load_model, load_scaler, LinearClassifier, StandardScaler, StatExtractor};
use airpad_pipeline::PipelineHandle;

use crate::config::AppConfig;

const USAGE: &str = "\
airpad - motion-gesture keyboard daemon

USAGE:
    airpad [OPTIONS]

OPTIONS:
    -c, --config <PATH>   Read configuration from PATH (fatal if unreadable)
        --dry-run         Log key actions instead of injecting them
    -h, --help            Print this help
";

/// How often the run loop logs queue counters.
const STATS_PERIOD: Duration = Duration::from_secs(10);

/// Run loop granularity; bounds how quickly we notice the pipeline ended.
const POLL_PERIOD: Duration = Duration::from_millis(250);

enum Cli {
    Run(CliArgs),
    Help,
}

struct CliArgs {
    config: Option<PathBuf>,
    dry_run: bool,
}

fn parse_args() -> Result<Cli> {
    let mut args = std::env::args().skip(1);
    let mut parsed = CliArgs {
        config: None,
        dry_run: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let value = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--dry-run" => parsed.dry_run = true,
            "-h" | "--help" => return Ok(Cli::Help),
            other => bail!("unknown argument `{other}` (try --help)"),
        }
    }

    Ok(Cli::Run(parsed))
}

fn main() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    builder.init();

    let args = match parse_args()? {
        Cli::Help => {
            print!("{USAGE}");
            return Ok(());
        }
        Cli::Run(args) => args,
    };

    if let Err(err) = run(args) {
        log::error!("fatal: {err:#}");
        return Err(err);
    }
    Ok(())
}

fn run(args: CliArgs) -> Result<()> {
    log::info!("--- airpad v{} starting ---", env!("CARGO_PKG_VERSION"));

    let cfg = config::load(args.config.as_deref())?;
    log::info!(
        "listening on {}, model {}, scaler {}",
        cfg.network.listen_addr,
        cfg.model.model_path.display(),
        cfg.model.scaler_path.display(),
    );

    // Artifact problems are startup failures; nothing runs half-loaded.
    let (model, feature_set) = load_model(&cfg.model.model_path)
        .with_context(|| format!("loading model from {}", cfg.model.model_path.display()))?;
    let scaler = load_scaler(&cfg.model.scaler_path)
        .with_context(|| format!("loading scaler from {}", cfg.model.scaler_path.display()))?;
    let extractor = StatExtractor::new(feature_set);
    log::info!(
        "model ready: {} classes, `{}` feature set ({} values)",
        model.classes().len(),
        feature_set.name(),
        feature_set.arity(),
    );

    let source = UdpSampleSource::bind(
        cfg.network.listen_addr.as_str(),
        Duration::from_millis(cfg.pipeline.idle_wait_ms),
    )
    .with_context(|| format!("binding UDP socket on {}", cfg.network.listen_addr))?;

    if args.dry_run {
        log::info!("dry run: key actions go to the log only");
        return supervise(&cfg, source, extractor, scaler, model, LogSink);
    }

    #[cfg(feature = "inject")]
    match airpad_connectors::EnigoSink::new() {
        Ok(sink) => return supervise(&cfg, source, extractor, scaler, model, sink),
        Err(err) => {
            log::warn!("keyboard backend unavailable ({err}); falling back to the log sink");
            return supervise(&cfg, source, extractor, scaler, model, LogSink);
        }
    }

    #[cfg(not(feature = "inject"))]
    {
        log::info!("built without the `inject` feature; key actions go to the log");
        supervise(&cfg, source, extractor, scaler, model, LogSink)
    }
}

/// Start the pipeline, keep it company until it ends or the operator
/// interrupts, then take it down within the join deadline.
fn supervise<S, K>(
    cfg: &AppConfig,
    source: S,
    extractor: StatExtractor,
    scaler: StandardScaler,
    model: LinearClassifier,
    sink: K,
) -> Result<()>
where
    S: SampleSource + Send + 'static,
    K: ActionSink + Send + 'static,
{
    log::info!("delivering actions through the `{}` sink", sink.name());

    let handle = PipelineHandle::start(
        &cfg.pipeline,
        source,
        extractor,
        scaler,
        model,
        sink,
        MonotonicClock::new(),
    )
    .context("starting pipeline")?;

    let stop = handle.stop_flag();
    ctrlc::set_handler(move || {
        log::info!("interrupt received, stopping");
        stop.store(true, Ordering::Relaxed);
    })
    .context("installing the interrupt handler")?;

    let mut last_report = Instant::now();
    while handle.is_running() {
        thread::sleep(POLL_PERIOD);
        if last_report.elapsed() >= STATS_PERIOD {
            log::info!("{}", handle.stats());
            last_report = Instant::now();
        }
    }

    log::info!("final counters: {}", handle.stats());
    handle
        .shutdown(Duration::from_millis(DEFAULT_JOIN_TIMEOUT_MS))
        .context("stopping pipeline")?;

    log::info!("--- airpad stopped ---");
    Ok(())
}
