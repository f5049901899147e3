//! Background rotation timer.
//!
//! The task sleeps for the engine's rotation interval, runs one rotation,
//! then re-arms.  Because the next sleep only starts after the previous
//! rotation has returned, two rotations can never overlap.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{OxumEngine, RotationOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationState {
    Stopped,
    Running,
}

pub struct RotationService {
    engine: Arc<Mutex<OxumEngine>>,
    outcomes: watch::Sender<Option<RotationOutcome>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl RotationService {
    pub fn new(engine: Arc<Mutex<OxumEngine>>) -> Self {
        let (outcomes, _) = watch::channel(None);
        Self {
            engine,
            outcomes,
            shutdown_tx: None,
            task: None,
        }
    }

    pub fn engine(&self) -> Arc<Mutex<OxumEngine>> {
        Arc::clone(&self.engine)
    }

    pub fn state(&self) -> RotationState {
        match &self.task {
            Some(task) if !task.is_finished() => RotationState::Running,
            _ => RotationState::Stopped,
        }
    }

    /// Latest rotation outcome, updated after every pass.
    pub fn subscribe(&self) -> watch::Receiver<Option<RotationOutcome>> {
        self.outcomes.subscribe()
    }

    /// Spawn the rotation loop.  No-op when already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.state() == RotationState::Running {
            debug!("rotation service already running");
            return;
        }

        let (shutdown_tx, mut rx) = watch::channel(false);
        let engine = Arc::clone(&self.engine);
        let outcomes = self.outcomes.clone();

        let task = tokio::spawn(async move {
            loop {
                let interval = engine.lock().await.rotation_interval();
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let outcome = engine.lock().await.perform_rotation();
                        outcomes.send_replace(Some(outcome));
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("rotation loop exited");
        });

        info!("rotation service started");
        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(task);
    }

    /// Signal the loop to stop and wait for it.  No-op when stopped.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(?err, "rotation task ended abnormally");
            }
            info!("rotation service stopped");
        }
    }
}

impl Drop for RotationService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use oxum_config::EngineConfig;
    use oxum_core::{ManualClock, ProfileScoreData};

    use super::*;

    fn shared_engine(interval_secs: u64) -> Arc<Mutex<OxumEngine>> {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let config = EngineConfig {
            rotation_interval_secs: interval_secs,
            ..Default::default()
        };
        let mut engine = OxumEngine::new(config, clock).unwrap();
        engine.activate_boost(ProfileScoreData::new("a", 1.0, 0.0, start));
        Arc::new(Mutex::new(engine))
    }

    #[tokio::test(start_paused = true)]
    async fn rotates_once_per_interval() {
        let engine = shared_engine(180);
        let mut service = RotationService::new(Arc::clone(&engine));
        assert_eq!(service.state(), RotationState::Stopped);

        service.start();
        assert_eq!(service.state(), RotationState::Running);

        tokio::time::sleep(Duration::from_secs(181)).await;
        assert_eq!(engine.lock().await.stats().rotations, 1);

        tokio::time::sleep(Duration::from_secs(360)).await;
        assert_eq!(engine.lock().await.stats().rotations, 3);

        service.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_rotation() {
        let engine = shared_engine(60);
        let mut service = RotationService::new(Arc::clone(&engine));
        service.start();
        tokio::time::sleep(Duration::from_secs(61)).await;

        service.stop().await;
        assert_eq!(service.state(), RotationState::Stopped);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(engine.lock().await.stats().rotations, 1);

        // Stopping twice is harmless.
        service.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_keeps_a_single_loop() {
        let engine = shared_engine(60);
        let mut service = RotationService::new(Arc::clone(&engine));
        service.start();
        service.start();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(engine.lock().await.stats().rotations, 1);
        service.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_latest_outcome() {
        let engine = shared_engine(30);
        let mut service = RotationService::new(engine);
        let mut outcomes = service.subscribe();
        service.start();

        outcomes.changed().await.unwrap();
        let latest: Option<RotationOutcome> = (*outcomes.borrow()).clone();
        assert_eq!(latest.as_ref().map(|o| o.rotation), Some(1));
        assert_eq!(latest.and_then(|o| o.top_profile).as_deref(), Some("a"));
        service.stop().await;
    }
}
