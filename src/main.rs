use anyhow::{Context, Result, bail};
use channel_screen::{
    config::Config,
    fetcher::Fetcher,
    pipeline::{BatchOutcome, MemoryStore, Pipeline, ProgressSnapshot},
    telemetry::{self, TracingSink},
};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing()?;

    let path = std::env::args()
        .nth(1)
        .context("usage: channel-screen <candidates-file>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
    let candidates = parse_candidates(&raw);
    if candidates.is_empty() {
        bail!("no candidates in {path}");
    }

    let config = Config::from_env()?;
    if let Some(source) = config.source() {
        info!("Loaded settings from {}", source.display());
    }
    let settings = config.into_settings();

    let fetcher = Fetcher::new(settings.fetcher)?.with_sink(Arc::new(TracingSink));
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(
        Arc::new(fetcher),
        store.clone(),
        settings.classifier,
        settings.pipeline,
    )?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; stopping after the current channel");
                cancel.cancel();
            }
        }
    });

    let (tx, mut rx) = mpsc::channel::<ProgressSnapshot>(16);
    let reporter = tokio::spawn(async move {
        while let Some(s) = rx.recv().await {
            info!(
                processed = s.processed,
                total = s.total,
                accepted = s.accepted,
                rejected = s.rejected,
                failed = s.failed,
                current = s.current.as_deref().unwrap_or(""),
                "Progress"
            );
        }
    });

    info!(session = %pipeline.session(), "Screening {} candidates", candidates.len());
    let outcome = pipeline.run(&candidates, Some(&tx), &cancel).await?;
    drop(tx);
    let _ = reporter.await;

    let mut stdout = std::io::stdout().lock();
    for record in store.records() {
        serde_json::to_writer(&mut stdout, &record)?;
        writeln!(stdout)?;
    }

    match outcome {
        BatchOutcome::Completed(_) => Ok(()),
        BatchOutcome::Cancelled(s) => {
            warn!("Cancelled after {} of {} candidates", s.processed, s.total);
            Ok(())
        }
        BatchOutcome::Halted { input, blocked, .. } => {
            bail!("halted at {input}: {blocked}")
        }
    }
}

/// One candidate per line; blank lines and `#` comments are skipped and only
/// the first comma-separated field is used.
fn parse_candidates(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split(',').next())
        .map(|field| field.trim().trim_matches('"').to_string())
        .filter(|field| !field.is_empty())
        .collect()
}
