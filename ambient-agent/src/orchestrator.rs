//! Pipeline orchestrator (C6, §4.6): owns the capture loop, dispatches
//! analyse-and-store work without blocking the ticker, exposes `chat` and
//! `status`.
//!
//! The ticker grabs a `Capture` synchronously then `try_send`s it to a
//! single worker over a capacity-1 channel — a busy worker means the tick
//! is dropped rather than queued, generalizing the donor's
//! `HealthManager::start_periodic_checks` ticker shape
//! (`backend-rust-orchestrator/src/health.rs`) from a fixed health probe to
//! a cancellable, backpressured capture pipeline.

use ambient_core::{Capture, MemoryMetadata};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::SharedState;

pub struct Orchestrator {
    state: SharedState,
    cancel: CancellationToken,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Status {
    pub running: bool,
    pub last_state: Option<String>,
    pub enhancements_made: u64,
    pub last_enhancement: Option<chrono::DateTime<chrono::Utc>>,
}

impl Orchestrator {
    pub fn new(state: SharedState, cancel: CancellationToken) -> Self {
        Self { state, cancel }
    }

    /// §4.6 "Startup": health checks against C2's endpoint and C4's
    /// `/health`; either failing aborts startup.
    pub async fn run_startup_checks(&self) -> Result<(), ambient_core::StartupError> {
        self.state
            .vision
            .health()
            .await
            .map_err(|e| ambient_core::StartupError::HealthCheck {
                component: "vision-llm".to_string(),
                source: e.into(),
            })?;
        info!("Vision LLM health check passed");

        self.state
            .store
            .health()
            .await
            .map_err(|e| ambient_core::StartupError::HealthCheck {
                component: "memory-store".to_string(),
                source: e.into(),
            })?;
        info!("Memory store health check passed");
        Ok(())
    }

    /// Spawns the ticker and the single analyse/store worker. Returns
    /// immediately; both tasks observe `cancel` for shutdown.
    pub fn spawn(&self) {
        if !self.state.config.capture.enabled {
            info!("Capture loop disabled by configuration");
            return;
        }

        let (tx, rx) = mpsc::channel::<Capture>(1);

        let worker_state = self.state.clone();
        let worker_cancel = self.cancel.clone();
        tokio::spawn(Self::run_worker(worker_state, rx, worker_cancel));

        let ticker_state = self.state.clone();
        let ticker_cancel = self.cancel.clone();
        tokio::spawn(Self::run_ticker(ticker_state, tx, ticker_cancel));
    }

    async fn run_ticker(
        state: SharedState,
        tx: mpsc::Sender<Capture>,
        cancel: CancellationToken,
    ) {
        let interval_seconds = state.config.capture.effective_interval_seconds();
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Capture ticker stopping on shutdown signal");
                    return;
                }
                _ = interval.tick() => {
                    match state.capture.capture_primary().await {
                        Ok(capture) => {
                            if tx.try_send(capture).is_err() {
                                debug!("Worker busy, dropping this capture tick");
                            }
                        }
                        Err(e) => {
                            if state.config.app.verbose {
                                warn!(error = %e, "Capture failed, skipping this tick");
                            }
                        }
                    }
                }
            }
        }
    }

    async fn run_worker(
        state: SharedState,
        mut rx: mpsc::Receiver<Capture>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Analyse/store worker stopping on shutdown signal");
                    return;
                }
                capture = rx.recv() => {
                    match capture {
                        Some(capture) => Self::process_capture(&state, capture).await,
                        None => return,
                    }
                }
            }
        }
    }

    /// §4.6 "Capture loop" steps 1-5: sequential within a single job.
    async fn process_capture(state: &SharedState, capture: Capture) {
        let memory_window = state.config.app.memory_window;

        let previous_context = match state.store.get_recent(memory_window).await {
            Ok(memories) => memories
                .into_iter()
                .map(|m| m.content)
                .collect::<Vec<_>>()
                .join(" "),
            Err(e) => {
                if state.config.app.verbose {
                    warn!(error = %e, "Failed to read recent memories, proceeding without context");
                }
                String::new()
            }
        };

        let analysis = match state
            .vision
            .analyze(&capture.jpeg, &previous_context)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Vision analysis failed, dropping capture");
                return;
            }
        };

        let content = analysis.to_memory_content();
        let metadata = MemoryMetadata {
            timestamp: capture.captured_at,
            context: analysis.context.clone(),
            activities: analysis.activities.clone(),
            key_elements: analysis.key_elements.clone(),
            user_intent: analysis.user_intent.clone(),
            display_num: capture.display_index,
        };

        if let Err(e) = state.store.add(&content, &metadata).await {
            warn!(error = %e, "Failed to store memory, dropping capture");
            return;
        }

        *state.last_state.write().await = Some(analysis.summary.clone());
    }

    /// §4.6 "Chat entry point".
    pub async fn chat(&self, msg: &str) -> Result<String, ambient_core::error::LlmError> {
        let memory_window = self.state.config.app.memory_window;
        let results = self
            .state
            .store
            .search(msg, memory_window)
            .await
            .unwrap_or_default();
        let contexts: Vec<String> = results.into_iter().map(|r| r.memory.content).collect();
        self.state.chat.generate(msg, &contexts).await
    }

    pub async fn status(&self) -> Status {
        let stats = self.state.enhancer.stats().await;
        Status {
            running: !self.cancel.is_cancelled(),
            last_state: self.state.last_state.read().await.clone(),
            enhancements_made: stats.enhancements_made,
            last_enhancement: stats.last_enhancement,
        }
    }
}
