mod effectors;
mod error;
mod input;
mod watch;
mod worker;

use std::path::PathBuf;

use crossbeam_channel::{unbounded, Sender};
use gesture::GestureEngine;
use nix::sys::signal::{SigSet, Signal};
use shared::{path_temp_pid, path_temp_pids};
use tracing::{error, info};
use tunables::DEFAULT_TUNABLES_PATH;

use crate::{
    effectors::DeviceEffectors,
    error::Error,
    input::input_init,
    watch::{reload, watch_thread, Watcher},
    worker::{Worker, WorkerEvent},
};

/// Sent to the helper threads over their command channels
#[derive(Debug, Copy, Clone)]
pub enum Command {
    Stop,
}

fn main() {
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("info")
            .compact()
            .init();
    }

    if let Err(err) = run() {
        error!("{err}");
        std::process::exit(1);
    }
}

/// Blocks SIGTERM and SIGINT for the calling thread and everything it spawns
/// afterwards, then waits for them on a thread of their own
fn stop_on_signal(event_tx: Sender<WorkerEvent>) -> Result<(), Error> {
    let mut signals = SigSet::empty();
    signals.add(Signal::SIGTERM);
    signals.add(Signal::SIGINT);
    signals.thread_block().map_err(Error::Signals)?;

    std::thread::spawn(move || match signals.wait() {
        Ok(signal) => {
            info!("Received {signal:?}, stopping");
            event_tx.send(WorkerEvent::Stop).ok();
        }
        Err(err) => error!("Failed to wait for signals: {err}"),
    });

    Ok(())
}

fn run() -> Result<(), Error> {
    info!("wake startup");

    let tunables_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TUNABLES_PATH));

    std::fs::create_dir_all(path_temp_pids())?;
    std::fs::write(path_temp_pid("wake"), std::process::id().to_string())?;

    info!("Loading tunables from {}...", tunables_path.display());
    let tunables = reload(&tunables_path);

    let (event_tx, event_rx) = unbounded::<WorkerEvent>();
    stop_on_signal(event_tx.clone())?;

    info!("Starting input threads...");
    let mut input_handles = input_init(event_tx.clone())?;

    info!("Starting watcher...");
    let (watch_command, watch_handle) = watch_thread(Watcher::new(
        tunables.host.clone(),
        tunables_path,
        event_tx,
    ));

    let effectors = DeviceEffectors::open(&tunables.host)?;
    let geometry = tunables.geometry();
    let engine = GestureEngine::new(tunables.gesture, geometry);

    Worker::new(engine, effectors).run(&event_rx);

    info!("Stopping helper threads");
    input_handles.broadcast(Command::Stop).ok();
    watch_command.send(Command::Stop).ok();

    if input_handles.join().is_err() {
        error!("An input thread panicked");
    }
    if watch_handle.join().is_err() {
        error!("The watch thread panicked");
    }

    info!("wake exiting");
    Ok(())
}
