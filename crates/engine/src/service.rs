use std::sync::Arc;

use log::info;
use matchbook_dispatch::{
    DispatchResult, DispatchStatsSnapshot, Dispatcher, MatchPass, create_dispatcher,
};
use matchbook_matching::ContinuousDoubleAuction;
use matchbook_ports::{Clock, MatchingAlgorithm, OrderStore};
use parking_lot::Mutex;

use crate::config::{ConfigError, EngineConfig};
use crate::poll::{PollHandle, PollLoop, TickReport};

/// The matcher as one embeddable unit
///
/// Wires store, algorithm, dispatcher and poll loop together. `start` starts
/// the dispatcher before the poll loop; `shutdown` stops the poll loop before
/// the dispatcher, so every batch handed over is still matched.
pub struct MatchService {
    config: EngineConfig,
    dispatcher: Arc<dyn Dispatcher>,
    poll: Arc<PollLoop>,
    handle: Mutex<Option<PollHandle>>,
}

impl MatchService {
    /// Build a service running the continuous double auction
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn OrderStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let algorithm = Arc::new(ContinuousDoubleAuction::with_description(
            config.match_description.as_str(),
        ));
        Self::with_algorithm(config, store, clock, algorithm)
    }

    pub fn with_algorithm(
        config: EngineConfig,
        store: Arc<dyn OrderStore>,
        clock: Arc<dyn Clock>,
        algorithm: Arc<dyn MatchingAlgorithm>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let pass = Arc::new(MatchPass::new(algorithm, clock, Arc::clone(&store)));
        let dispatcher = create_dispatcher(&config.dispatch, pass);
        let poll = Arc::new(PollLoop::new(
            store,
            Arc::clone(&dispatcher),
            config.poll_interval(),
        ));

        Ok(Self {
            config,
            dispatcher,
            poll,
            handle: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.dispatcher.stats()
    }

    pub fn is_polling(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(PollHandle::is_running)
    }

    /// Start the dispatcher, then the background poll loop
    pub async fn start(&self) -> DispatchResult<()> {
        self.dispatcher.start().await?;

        let mut handle = self.handle.lock();
        if handle.is_none() {
            *handle = Some(Arc::clone(&self.poll).spawn());
            info!(
                "match service started: {} polling every {:?}",
                self.dispatcher.name(),
                self.config.poll_interval()
            );
        }
        Ok(())
    }

    /// Run a single poll cycle now
    ///
    /// Passes are only dispatched; they may still be running on return.
    pub async fn poll_once(&self) -> TickReport {
        self.poll.tick().await
    }

    /// Stop polling, then wait for dispatched passes to finish
    pub async fn shutdown(&self) -> DispatchResult<()> {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
        }

        self.dispatcher.destroy().await?;

        let stats = self.dispatcher.stats();
        info!(
            "match service stopped: {} passes completed, {} failed ({} stale), {} panicked, {} trades",
            stats.passes_completed,
            stats.passes_failed,
            stats.passes_stale,
            stats.passes_panicked,
            stats.trades
        );
        Ok(())
    }
}
