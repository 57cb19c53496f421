//! Matchbook Engine
//!
//! The outer layer of the continuous matcher:
//!
//! - [`EngineConfig`]: JSON configuration with defaults and validation
//! - [`PollLoop`]: periodic list → fetch → dispatch cycle
//! - [`MatchService`]: start/shutdown lifecycle over store, dispatcher and loop
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use matchbook_clock::SystemClock;
//! use matchbook_engine::{EngineConfig, MatchService};
//! use matchbook_store::InMemoryOrderStore;
//!
//! let config = EngineConfig::from_file("matchbook.json")?;
//! let service = MatchService::new(config, Arc::new(InMemoryOrderStore::new()), Arc::new(SystemClock::new()))?;
//! service.start().await?;
//! // ...
//! service.shutdown().await?;
//! ```

mod config;
mod poll;
mod service;

pub use config::{ConfigError, EngineConfig};
pub use poll::{PollHandle, PollLoop, TickReport};
pub use service::MatchService;

pub use matchbook_dispatch::{DispatchConfig, DispatchMode, PartitionerKind};
