//! Command-line driver for the `Image2GPS` staged reveal.
//!
//! Plays a scripted list of sample selections against a live session
//! driver and logs what the view would show at every stage change.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `image2gps-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the sample registry
//! 4. Build the coordinator and spawn the session driver
//! 5. Play each scripted selection, waiting for idle or reselecting early
//! 6. Shut the driver down and log the run summary

mod error;

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use image2gps_core::config::{LoggingConfig, MapConfig, ScriptConfig};
use image2gps_core::runner::{self, RunSummary};
use image2gps_core::{Coordinator, DemoConfig, RunnerError, SessionHandle, ViewModel};
use image2gps_samples::SampleRegistry;
use image2gps_types::{Record, SessionSnapshot, Stage};
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::DemoError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "image2gps-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the registry, or the session driver
/// fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, from_file) = load_config().context("loading configuration")?;
    init_tracing(&config.logging);

    info!("image2gps-demo starting");
    info!(
        from_file,
        seed = ?config.randomness.seed,
        loading_min_ms = config.timing.loading_min_ms,
        loading_max_ms = config.timing.loading_max_ms,
        selections = config.demo.selections.len(),
        "Configuration loaded"
    );

    let summary = run(&config).await?;
    info!(
        selections = summary.selections,
        timers_fired = summary.timers_fired,
        final_ms = summary.final_ms,
        "image2gps-demo finished"
    );
    Ok(())
}

/// Load `image2gps-config.yaml`, falling back to defaults when missing.
///
/// The flag reports whether the file was found.
fn load_config() -> Result<(DemoConfig, bool), DemoError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok((DemoConfig::from_file(path)?, true))
    } else {
        Ok((DemoConfig::parse("")?, false))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Play the scripted selections and return the driver's summary.
async fn run(config: &DemoConfig) -> Result<RunSummary, DemoError> {
    let registry = SampleRegistry::penn_engineering()?;
    info!(
        samples = registry.len(),
        default = %registry.default_record().id,
        gallery_columns = ?column_sizes(&registry),
        "Sample registry loaded"
    );

    let coordinator = Coordinator::from_config(config);
    let (handle, driver) = runner::spawn(coordinator);
    let watcher = tokio::spawn(watch_views(handle.subscribe(), config.map.clone()));

    let script = script(&config.demo, &registry);
    play(&handle, &script, config.demo.reselect_after_ms).await?;

    handle.shutdown().await?;
    let summary = driver.await??;
    let published = watcher.await??;
    debug!(published, "View watcher stopped");
    Ok(summary)
}

/// Record counts of the left and right gallery columns.
fn column_sizes(registry: &SampleRegistry) -> (usize, usize) {
    let (left, right) = registry.gallery_columns();
    (left.len(), right.len())
}

/// Resolve the scripted ids to records. Unknown ids fall back to the
/// default sample; an empty script plays the default sample once.
fn script<'a>(demo: &ScriptConfig, registry: &'a SampleRegistry) -> Vec<&'a Record> {
    if demo.selections.is_empty() {
        return vec![registry.default_record()];
    }
    demo.selections
        .iter()
        .map(|id| registry.resolve(id))
        .collect()
}

/// Select each record in turn.
///
/// With `reselect_after_ms` set, every selection but the last is replaced
/// after that delay, whatever its stage. Otherwise each one runs to idle.
async fn play(
    handle: &SessionHandle,
    script: &[&Record],
    reselect_after_ms: Option<u64>,
) -> Result<(), DemoError> {
    let mut snapshots = handle.subscribe();
    let mut expected_generation: u64 = 0;
    let last = script.len().saturating_sub(1);

    for (index, record) in script.iter().enumerate() {
        info!(sample = %record.id, title = record.title, "Selecting sample");
        handle.select((*record).clone()).await?;
        expected_generation = expected_generation.saturating_add(1);

        match reselect_after_ms {
            Some(delay_ms) if index < last => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            _ => wait_for_idle(&mut snapshots, expected_generation).await?,
        }
    }
    Ok(())
}

/// Wait until the session for `generation` has settled.
async fn wait_for_idle(
    snapshots: &mut watch::Receiver<SessionSnapshot>,
    generation: u64,
) -> Result<(), RunnerError> {
    snapshots
        .wait_for(|snap| snap.generation == generation && snap.stage == Stage::Idle)
        .await
        .map(|_| ())
        .map_err(|_closed| RunnerError::ChannelClosed)
}

/// Log a view at every stage change until the driver stops publishing.
///
/// Returns how many snapshots were observed.
async fn watch_views(
    mut snapshots: watch::Receiver<SessionSnapshot>,
    map: MapConfig,
) -> Result<u64, DemoError> {
    let mut last: Option<(u64, Stage)> = None;
    let mut observed: u64 = 0;

    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        observed = observed.saturating_add(1);
        let key = (snapshot.generation, snapshot.stage);

        if last == Some(key) {
            debug!(
                generation = snapshot.generation,
                progress = snapshot.progress,
                chars = snapshot.text.chars().count(),
                "Snapshot"
            );
            continue;
        }
        last = Some(key);

        let view = ViewModel::project(&snapshot, &map);
        info!(
            generation = snapshot.generation,
            stage = %view.stage,
            headline = view.headline,
            progress = view.progress,
            coordinates = view.coordinates,
            badge = view.stream_badge,
            "Stage changed"
        );
        if view.stage == Stage::Idle && snapshot.selection.is_some() {
            info!(view = %serde_json::to_string(&view)?, "Final view");
        }
    }
    Ok(observed)
}
