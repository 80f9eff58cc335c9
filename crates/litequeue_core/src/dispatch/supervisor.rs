//! Dispatch supervisor: keeps exactly one worker alive until cancellation.

use std::any::Any;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::Worker;
use crate::config::RestartPolicy;

/// Sliding-window restart counter.
///
/// Records restarts and decides whether the next one must wait out the
/// policy's cooldown.
#[derive(Debug)]
pub struct RestartTracker {
    policy: RestartPolicy,
    recent: VecDeque<Instant>,
}

impl RestartTracker {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            policy,
            recent: VecDeque::new(),
        }
    }

    /// Record a restart at `now`. Returns the cooldown to wait first when the
    /// window already holds `max_restarts` restarts.
    pub fn record(&mut self, now: Instant) -> Option<Duration> {
        let window = self.policy.window();
        while let Some(&oldest) = self.recent.front() {
            if now.duration_since(oldest) >= window {
                self.recent.pop_front();
            } else {
                break;
            }
        }

        self.recent.push_back(now);
        if self.recent.len() > self.policy.max_restarts as usize {
            // Start a fresh window after the cooldown
            self.recent.clear();
            Some(self.policy.cooldown())
        } else {
            None
        }
    }

    /// Restarts currently counted against the window.
    pub fn recent_restarts(&self) -> usize {
        self.recent.len()
    }
}

/// Outer control loop around the dispatch worker.
pub(crate) struct Supervisor {
    worker: Worker,
    restarts: RestartTracker,
}

impl Supervisor {
    pub(crate) fn new(worker: Worker, policy: RestartPolicy) -> Self {
        Self {
            worker,
            restarts: RestartTracker::new(policy),
        }
    }

    /// Start supervising in the background.
    pub(crate) fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(mut self) {
        let cancel = self.worker.cancel_token().clone();
        info!("Dispatch supervisor started");

        loop {
            let handle = tokio::spawn(self.worker.clone().run());

            match handle.await {
                Ok(()) if cancel.is_cancelled() => break,
                Ok(()) => warn!("Dispatch worker exited without being cancelled"),
                Err(e) if e.is_panic() => {
                    error!(
                        "Dispatch worker panicked in item handler: {}",
                        panic_message(e.into_panic())
                    );
                }
                Err(e) => error!("Dispatch worker failed: {}", e),
            }

            if cancel.is_cancelled() {
                break;
            }

            if let Some(cooldown) = self.restarts.record(Instant::now()) {
                warn!(
                    "Dispatch worker restarting too often, waiting {:?} before the next restart",
                    cooldown
                );
                tokio::select! {
                    _ = tokio::time::sleep(cooldown) => {}
                    _ = cancel.cancelled() => break,
                }
            }

            info!("Restarting dispatch worker");
        }

        info!("Dispatch supervisor stopped");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
