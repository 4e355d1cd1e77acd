use std::time::{Duration, Instant};

use crossbeam_channel::{after, never, select, Receiver};
use gesture::{Effectors, GestureEngine, Tick, TouchEvent};
use tracing::{debug, error, info};
use tunables::Tunables;

use crate::error::Error;

pub const WORKER_CPU: usize = 0;

/// Everything the worker reacts to, from any thread
#[derive(Debug)]
pub enum WorkerEvent {
    Touch(TouchEvent),
    /// A physical press of the power button
    PowerKeyPressed,
    Suspend,
    Resume,
    Proximity(bool),
    Reconfigure(Box<Tunables>),
    /// Leave the event loop so the helper threads can be stopped
    Stop,
}

/// Milliseconds since the daemon started
#[derive(Debug, Copy, Clone)]
pub struct Clock(Instant);

impl Default for Clock {
    fn default() -> Self {
        Clock(Instant::now())
    }
}

impl Clock {
    pub fn now(&self) -> Tick {
        self.0.elapsed().as_millis() as Tick
    }
}

pub struct Worker<E> {
    engine: GestureEngine,
    effectors: E,
    clock: Clock,
}

impl<E: Effectors> Worker<E> {
    pub fn new(engine: GestureEngine, effectors: E) -> Self {
        Worker {
            engine,
            effectors,
            clock: Clock::default(),
        }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    #[cfg(test)]
    pub fn effectors(&self) -> &E {
        &self.effectors
    }

    pub fn handle(&mut self, event: WorkerEvent, now: Tick) {
        match event {
            WorkerEvent::Touch(touch) => {
                if let Some(action) = self.engine.handle_event(touch, now) {
                    action.perform(&mut self.effectors);
                }
            }
            WorkerEvent::PowerKeyPressed => {
                debug!("Power key pressed");
                self.engine.power_key_pressed(now);
            }
            WorkerEvent::Suspend => self.engine.suspend(now),
            WorkerEvent::Resume => self.engine.resume(now),
            WorkerEvent::Proximity(covered) => self.engine.set_proximity(covered),
            WorkerEvent::Reconfigure(tunables) => {
                info!("Applying new tunables");
                let geometry = tunables.geometry();
                self.engine.set_config(tunables.gesture);
                self.engine.set_geometry(geometry);
            }
            WorkerEvent::Stop => (),
        }
    }

    /// Runs until told to stop or every sender is gone
    pub fn run(&mut self, event_rx: &Receiver<WorkerEvent>) {
        match shared::pin_current_thread(WORKER_CPU) {
            Ok(()) => info!("Worker pinned to CPU {WORKER_CPU}"),
            Err(source) => error!(
                "{}",
                Error::Affinity {
                    cpu: WORKER_CPU,
                    source
                }
            ),
        }

        info!("Entering event loop...");
        loop {
            // Rebuilt every pass so a resume drops a pending expiry at once
            let expiry = match self.engine.touchwake_deadline() {
                Some(deadline) => after(Duration::from_millis(
                    deadline.saturating_sub(self.clock.now()),
                )),
                None => never(),
            };

            select! {
                recv(event_rx) -> event => match event {
                    Ok(WorkerEvent::Stop) => {
                        info!("Stop requested");
                        break;
                    }
                    Ok(event) => {
                        let now = self.clock.now();
                        self.handle(event, now);
                    }
                    Err(_) => break,
                },
                recv(expiry) -> _ => {
                    self.engine.poll_touchwake(self.clock.now());
                }
            }
        }

        info!("Worker done");
    }
}
