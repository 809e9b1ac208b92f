use anyhow::Result;
use log::warn;
use tokio::sync::broadcast::error::RecvError;

use crate::{
    capture::{
        FrameSource, InboxDirectory, ScanController, ScanEvent, ScanOutcome, SkipReason,
        SnapshotFile,
    },
    cli::ScanArgs,
    recognition::GeminiClient,
    AppState,
};

/// Default snapshot location when neither `--frame` nor `--inbox` is given.
pub const DEFAULT_FRAME_FILE: &str = "frame.jpg";

pub async fn handle(state: &AppState, args: ScanArgs) -> Result<()> {
    if let Some(dir) = args.inbox.clone() {
        return run(state, InboxDirectory::new(dir), &args).await;
    }
    let frame = args
        .frame
        .clone()
        .unwrap_or_else(|| state.data_dir.join(DEFAULT_FRAME_FILE));
    run(state, SnapshotFile::new(frame), &args).await
}

async fn run<F: FrameSource>(state: &AppState, frames: F, args: &ScanArgs) -> Result<()> {
    let recognizer = GeminiClient::new(&state.config.recognition())?;
    let controller = ScanController::new(
        state.store.clone(),
        frames,
        recognizer,
        state.config.capture(),
    );

    let settings = state.store.settings().await;
    let continuous = !args.once && (args.auto || settings.auto_scan);
    if !continuous {
        let outcome = controller.scan_now().await;
        println!("{}", describe_outcome(&outcome));
        return Ok(());
    }

    if state.store.api_key().await.trim().is_empty() {
        warn!("No API key set; every tick will be skipped");
    }

    let mut events = controller.subscribe();
    controller.start_auto().await?;
    println!(
        "Auto-scan every {} ms. Press Ctrl-C to stop.",
        settings.scan_interval
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(missed)) => warn!("{missed} scan events dropped"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    controller.stop_auto().await?;
    // The cycle in flight when Ctrl-C arrived still commits its card.
    controller.wait_idle().await;
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }

    let view = controller.status_view().await;
    if let Some(error) = view.error {
        println!("{error}");
    }
    println!("{} cards added.", view.cards_added);
    Ok(())
}

pub fn describe_outcome(outcome: &ScanOutcome) -> String {
    match outcome {
        ScanOutcome::Skipped(SkipReason::Busy) => "A scan is already in progress.".into(),
        ScanOutcome::Skipped(SkipReason::MissingCredential) => {
            "No API key set. Run `card-scanner settings set-key <KEY>` first.".into()
        }
        ScanOutcome::NoFrame => "No frame available.".into(),
        ScanOutcome::NoCard => "Could not identify a card. Try again.".into(),
        ScanOutcome::Added(card) => format!("Scanned: {}", card.name),
        ScanOutcome::Failed { message, .. } => format!("Error: {message}"),
    }
}

fn print_event(event: &ScanEvent) {
    match event {
        ScanEvent::CardAdded { name, .. } => println!("Scanned: {name}"),
        ScanEvent::NoCard => println!("No card in frame."),
        // Failures stay quiet until auto-scan stops; the status view reports the last one.
        ScanEvent::Failed { .. } | ScanEvent::CaptureStarted { .. } | ScanEvent::TickDropped => {}
    }
}
