//! # Flow Journal Core Library
//!
//! Core logic for Flow Journal, a writing tool that rewards sustained, fast
//! typing with a rising flow gauge and fades the workspace out when the
//! writer stalls. The CLI (and any GUI shell) is a thin presentation layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Flow engine**: a tick-driven state machine. The caller feeds text
//!   changes in and invokes `tick()` once per second; nothing in the
//!   engine spawns threads or sleeps
//! - **Storage**: TOML-based configuration
//! - **Integrations**: async clients for the text-analysis and billing
//!   collaborators
//!
//! ## Key Components
//!
//! - [`FlowSession`]: Session controller (phase, gauge, statistics)
//! - [`RateEstimator`]: Sliding-window characters-per-minute
//! - [`ThresholdPolicy`]: CPM -> flow category and gauge delta
//! - [`DegradationController`]: Fade countdown and recovery
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod flow;
pub mod integrations;
pub mod storage;

pub use error::{CollaboratorError, ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use flow::{
    DegradationController, DegradationSignal, DegradationState, EndReason, FlowCategory,
    FlowConfig, FlowSession, FlowSnapshot, RateEstimator, SessionPhase, SessionStats,
    SessionTimer, ThresholdPolicy,
};
pub use integrations::{BillingClient, SummaryClient, SummaryRequest, SummaryResult};
pub use storage::Config;
