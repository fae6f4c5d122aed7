// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chipscan — point a camera at a chip, get its part code.
//
// Entry point. Initialises logging, loads settings, opens a scan session over
// the camera (or replayed images) and prints the codes it finds. Ctrl-C
// closes the session.

mod cli;
mod services;

use std::process::ExitCode;

use chipscan_bridge::{FrameSource, ReplaySource, platform_camera};
use chipscan_core::ScannerConfig;
use chipscan_core::error::Result;
use chipscan_core::human_errors::humanize_error;
use chipscan_scanner::{ScanController, ScanEvent};
use chipscan_vision::OcrsRecognizer;
use chipscan_vision::ocr::OcrConfig;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use cli::Args;
use services::config_store::ConfigStore;

/// How a scan run ended.
enum Outcome {
    Found,
    Interrupted,
    CameraFailed,
    ConfigSaved,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Chipscan starting");

    match run(Args::parse()).await {
        Ok(Outcome::Found | Outcome::ConfigSaved) => ExitCode::SUCCESS,
        Ok(Outcome::Interrupted) => ExitCode::from(130),
        Ok(Outcome::CameraFailed) => ExitCode::from(2),
        Err(err) => {
            tracing::error!(error = %err, "Chipscan failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<Outcome> {
    let store = match &args.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::default_location(),
    };
    let config = args.resolve_config(&store)?;

    if args.save_config {
        store.save(&config)?;
        println!("{}", store.path().display());
        return Ok(Outcome::ConfigSaved);
    }

    let recognizer = load_recognizer(&args, &config)?;
    let source: Box<dyn FrameSource> = if args.images.is_empty() {
        platform_camera(config.camera.clone())
    } else {
        Box::new(ReplaySource::from_paths(&args.images, config.camera.clone())?)
    };
    info!(source = source.name(), interval_ms = config.scan_interval_ms, "Opening scanner");

    let (observer, mut events) = mpsc::unbounded_channel();
    let handle = ScanController::new(source, recognizer, observer, &config)?.spawn();
    info!(session = %handle.session_id(), "Scanning");
    let mut snapshots = handle.subscribe();
    handle.capture_now()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut found = false;
    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break if found { Outcome::Found } else { Outcome::Interrupted };
            }

            event = events.recv() => match event {
                Some(ScanEvent::Result(code)) => {
                    println!("{code}");
                    found = true;
                    if !args.watch {
                        break Outcome::Found;
                    }
                }
                Some(ScanEvent::Detection(detection)) => {
                    debug!(raw = %detection.raw_text, "Text recognized");
                }
                Some(ScanEvent::RecognitionFailed(err)) => {
                    warn!(message = %err.message, "Recognition failed; still scanning");
                }
                Some(ScanEvent::CameraError(err)) => {
                    eprintln!("{}\n{}", err.message, err.suggestion);
                    break Outcome::CameraFailed;
                }
                None => break Outcome::Interrupted,
            },

            Ok(()) = snapshots.changed() => {
                let snapshot = snapshots.borrow_and_update().clone();
                debug!(state = ?snapshot.state, progress = snapshot.progress, "Scanner");
            }
        }
    };

    handle.close().await;
    Ok(outcome)
}

fn load_recognizer(args: &Args, config: &ScannerConfig) -> Result<OcrsRecognizer> {
    let language = &config.recognition.language;
    match &args.model_dir {
        Some(dir) => OcrsRecognizer::from_model_dir(dir, language),
        None => OcrsRecognizer::new(&OcrConfig::default(), language),
    }
}
