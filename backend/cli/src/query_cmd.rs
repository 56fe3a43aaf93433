//! One-shot queries against an existing run.

use std::process::ExitCode;

use anyhow::{Context, Result};

use menusnap_core::{DishImageSet, ExtractionState, MenuBackend, RunId};

use crate::config::Settings;
use crate::terminal_output::{note_error, note_progress, render_images, render_menu};

/// `menusnap status <RUN_ID>`
pub async fn status(settings: &Settings, run_id: &str, json: bool) -> Result<ExitCode> {
    let backend = settings.backend(settings.http_client()?);
    let report = backend
        .get_status(&RunId::new(run_id))
        .await
        .with_context(|| format!("Status request for run {run_id} failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    let status = report.status.clone().unwrap_or_else(|| "UNKNOWN".to_string());
    match report.state() {
        ExtractionState::Pending => {
            note_progress(&format!("Run {run_id} is {status}"));
            Ok(ExitCode::SUCCESS)
        }
        ExtractionState::Extracted(menu) => {
            if !json {
                print!("{}", render_menu(&menu, &DishImageSet::new()));
            }
            Ok(ExitCode::SUCCESS)
        }
        ExtractionState::Failed(reason) => {
            note_error(&format!("Run {run_id} failed: {reason}"));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// `menusnap images <RUN_ID>`
pub async fn images(settings: &Settings, run_id: &str, json: bool) -> Result<ExitCode> {
    let backend = settings.backend(settings.http_client()?);
    let response = backend
        .get_images(&RunId::new(run_id))
        .await
        .with_context(|| format!("Image request for run {run_id} failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(ExitCode::SUCCESS);
    }

    let images = DishImageSet::from(response);
    if images.is_empty() {
        note_progress(&format!("No dish images for run {run_id}"));
    } else {
        print!("{}", render_images(&images));
    }
    Ok(ExitCode::SUCCESS)
}
