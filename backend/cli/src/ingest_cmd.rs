//! `menusnap ingest`: run the whole pipeline for a set of photos.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Result};
use serde_json::json;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::info;

use menusnap_client::HttpObjectStore;
use menusnap_core::{collect_image_assets, IngestError};
use menusnap_pipeline::{CompletedRun, PipelineCoordinator, PipelineState, SessionSnapshot};

use crate::config::Settings;
use crate::terminal_output::{note_error, note_progress, note_success, note_warn, render_menu};

/// Conventional exit status after SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

pub async fn run(
    settings: &Settings,
    paths: &[PathBuf],
    maps_url: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let assets = collect_image_assets(paths).await?;
    if assets.is_empty() {
        bail!("none of the {} given files is an image", paths.len());
    }

    let client = settings.http_client()?;
    let backend = Arc::new(settings.backend(client.clone()));
    let store = Arc::new(HttpObjectStore::with_client(client));

    let mut coordinator =
        PipelineCoordinator::new(backend, store).with_max_assets(settings.config.max_assets());
    if let Some(url) = maps_url.as_deref().or(settings.config.google_maps_url()) {
        coordinator = coordinator.with_google_maps_url(url);
    }

    let progress = tokio::spawn(print_progress(coordinator.subscribe()));
    info!(photos = assets.len(), "Starting ingestion");

    let run = coordinator.run(assets);
    tokio::pin!(run);
    let outcome = tokio::select! {
        outcome = &mut run => outcome,
        _ = tokio::signal::ctrl_c() => {
            coordinator.cancel();
            run.await
        }
    };
    progress.abort();

    Ok(report(outcome, &coordinator.state(), json))
}

async fn print_progress(rx: watch::Receiver<SessionSnapshot>) {
    let mut updates = WatchStream::from_changes(rx);
    while let Some(snapshot) = updates.next().await {
        if snapshot.state.is_active() {
            note_progress(&snapshot.state.to_string());
        }
    }
}

fn report(outcome: Result<CompletedRun, IngestError>, state: &PipelineState, json: bool) -> ExitCode {
    match outcome {
        Ok(done) => {
            if json {
                let body = json!({
                    "run_id": done.run_id,
                    "menu": done.menu,
                    "images": done.images.to_response(),
                });
                println!("{body:#}");
            } else {
                note_success(&format!("Run {} complete", done.run_id));
                print!("{}", render_menu(&done.menu, &done.images));
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = exit_status(&err);
            if matches!(err, IngestError::Cancelled) {
                note_warn("Cancelled");
                return ExitCode::from(code);
            }
            let run_id = state.run_id();
            if json {
                let body = json!({
                    "error": {
                        "run_id": run_id,
                        "kind": err.kind(),
                        "message": err.user_message(),
                    }
                });
                println!("{body:#}");
            }
            match run_id {
                Some(id) => note_error(&format!("{} (run {id})", err.user_message())),
                None => note_error(&err.user_message()),
            }
            ExitCode::from(code)
        }
    }
}

fn exit_status(err: &IngestError) -> u8 {
    match err {
        IngestError::Cancelled => EXIT_INTERRUPTED,
        IngestError::InvalidInput(_) => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menusnap_core::Stage;

    #[test]
    fn exit_status_by_error() {
        assert_eq!(exit_status(&IngestError::Cancelled), 130);
        assert_eq!(exit_status(&IngestError::InvalidInput("no photos".into())), 2);
        assert_eq!(exit_status(&IngestError::Timeout { attempts: 60 }), 1);
        assert_eq!(exit_status(&IngestError::request(Stage::Trigger, "boom")), 1);
    }
}
