//! Polls the display, proximity and tunables files for changes.
use std::{
    io,
    path::{Path, PathBuf},
    thread::JoinHandle,
    time::{Duration, SystemTime},
};

use crossbeam_channel::{select, tick, unbounded, Receiver, Sender};
use tracing::{debug, error, info, warn};
use tunables::{HostPaths, Tunables};

use crate::{worker::WorkerEvent, Command};

pub const WATCH_INTERVAL: Duration = Duration::from_millis(100);

/// A sysfs style integer attribute, non-zero meaning set
pub fn read_flag(path: &Path) -> io::Result<bool> {
    let contents = std::fs::read_to_string(path)?;
    let value = contents
        .trim()
        .parse::<i64>()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    Ok(value != 0)
}

/// Load tunables, falling back to defaults, and publish the corrected
/// values to the runtime directory
pub fn reload(path: &Path) -> Tunables {
    let tunables = match Tunables::load(path) {
        Ok(tunables) => tunables,
        Err(err) => {
            warn!("Failed to read tunables from {}: {err}, using defaults", path.display());
            Tunables::default()
        }
    };

    if let Err(err) = publish(&tunables) {
        error!("Failed to publish tunables: {err}");
    }

    tunables
}

fn publish(tunables: &Tunables) -> io::Result<()> {
    std::fs::create_dir_all(shared::TEMP_DIR)?;
    std::fs::write(shared::path_temp_tunables(), tunables.to_string())
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
}

/// Remembers the last observed state so only changes are reported
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Transitions {
    display_suspended: Option<bool>,
    proximity_covered: Option<bool>,
}

impl Transitions {
    pub fn display(&mut self, suspended: bool) -> Option<WorkerEvent> {
        if self.display_suspended.replace(suspended) == Some(suspended) {
            return None;
        }

        Some(if suspended {
            WorkerEvent::Suspend
        } else {
            WorkerEvent::Resume
        })
    }

    pub fn proximity(&mut self, covered: bool) -> Option<WorkerEvent> {
        if self.proximity_covered.replace(covered) == Some(covered) {
            return None;
        }

        Some(WorkerEvent::Proximity(covered))
    }
}

pub struct Watcher {
    host: HostPaths,
    tunables_path: PathBuf,
    tunables_modified: Option<SystemTime>,
    transitions: Transitions,
    event_tx: Sender<WorkerEvent>,
}

impl Watcher {
    pub fn new(host: HostPaths, tunables_path: PathBuf, event_tx: Sender<WorkerEvent>) -> Self {
        let tunables_modified = modified(&tunables_path);
        Watcher {
            host,
            tunables_path,
            tunables_modified,
            transitions: Transitions::default(),
            event_tx,
        }
    }

    /// Returns false once nobody is listening
    pub fn poll(&mut self) -> bool {
        let mut events = Vec::new();

        match read_flag(&self.host.display_state) {
            Ok(suspended) => events.extend(self.transitions.display(suspended)),
            Err(err) => debug!("Failed to read display state: {err}"),
        }

        if let Some(path) = &self.host.proximity {
            match read_flag(path) {
                Ok(covered) => events.extend(self.transitions.proximity(covered)),
                Err(err) => debug!("Failed to read proximity: {err}"),
            }
        }

        let tunables_modified = modified(&self.tunables_path);
        if tunables_modified != self.tunables_modified {
            self.tunables_modified = tunables_modified;
            info!("Tunables changed, reloading");

            let tunables = reload(&self.tunables_path);
            if tunables.host.vibrator != self.host.vibrator {
                warn!("vibrator_path changes apply on restart");
            }
            self.host.display_state = tunables.host.display_state.clone();
            self.host.proximity = tunables.host.proximity.clone();
            events.push(WorkerEvent::Reconfigure(Box::new(tunables)));
        }

        events
            .into_iter()
            .all(|event| self.event_tx.send(event).is_ok())
    }
}

pub fn watch_thread(mut watcher: Watcher) -> (Sender<Command>, JoinHandle<()>) {
    let (command_tx, command_rx): (Sender<Command>, Receiver<Command>) = unbounded();

    let join_handle = std::thread::spawn(move || {
        info!("Starting watch thread");

        let ticker = tick(WATCH_INTERVAL);
        loop {
            if !watcher.poll() {
                break;
            }

            select! {
                recv(command_rx) -> _ => break,
                recv(ticker) -> _ => (),
            }
        }

        info!("Watch thread done");
    });

    (command_tx, join_handle)
}
