mod console_observer;
mod simulated_backend;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use capture_session_core::{CaptureController, SessionConfiguration};

use console_observer::ConsoleObserver;
use simulated_backend::SimulatedBackend;

/// How long the demo keeps the capture running before stopping it.
const CAPTURE_SECONDS: u64 = 4;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => SessionConfiguration::load(&path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => SessionConfiguration::default(),
    };

    let backend = SimulatedBackend::new(vec![
        "Built-in Microphone".into(),
        "Karsect UPC-X USB Audio".into(),
    ]);
    let controller = CaptureController::new(Arc::new(backend), config)?;
    controller.set_observer(Arc::new(ConsoleObserver));

    if let Err(e) = controller.initialize().await {
        log::warn!("Starting without a device list: {}", e);
    }
    print_snapshot(&controller)?;

    controller.start().await?;
    tokio::time::sleep(Duration::from_secs(CAPTURE_SECONDS)).await;
    print_snapshot(&controller)?;

    controller.stop().await?;
    print_snapshot(&controller)?;
    Ok(())
}

fn print_snapshot(controller: &CaptureController) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&controller.snapshot())?;
    println!("{}", json);
    Ok(())
}
