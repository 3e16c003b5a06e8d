//! # Focuscoach Core Library
//!
//! Core logic for the focuscoach productivity coach. Everything the
//! `focuscoach` CLI does goes through this crate; the binary is a thin layer
//! of argument parsing and printing.
//!
//! ## Architecture
//!
//! - **Context**: telemetry rows and the validated [`UserContext`] built from them
//! - **Scoring**: per-dimension urgency plus load/receptivity signals
//! - **Selection**: ordered rule table mapping context to a [`Strategy`]
//! - **Templates**: persona- and personality-aware nudge text
//! - **Coach**: gating, confidence, nudge assembly and feedback adaptation
//! - **Simulator**: seeded synthetic users and telemetry
//! - **Report / Chart**: interaction log summaries with plain-text charts
//! - **Evolution**: per-persona strategy populations tuned from feedback
//! - **Storage**: TOML configuration and the data directory
//!
//! ## Key Components
//!
//! - [`Coach`]: the coaching engine
//! - [`InteractionLog`]: JSONL interaction history
//! - [`SummaryReport`]: results summary over a log
//! - [`EvolutionEngine`]: strategy evolution
//! - [`Config`]: application configuration management

pub mod chart;
pub mod coach;
pub mod context;
pub mod error;
pub mod evolution;
pub mod interaction;
pub mod persona;
pub mod report;
pub mod scoring;
pub mod selector;
pub mod simulator;
pub mod storage;
pub mod templates;
pub mod timing;

pub use coach::{Coach, CoachDecision, LearningState, Nudge, SessionSummary, SkipReason};
pub use context::{ContextFlag, TelemetrySample, UserContext};
pub use error::{ConfigError, CoreError, LogError, Result, ValidationError};
pub use evolution::{EvolutionEngine, EvolutionStrategy, GenerationReport};
pub use interaction::{DismissalReason, Interaction, InteractionLog, NudgeLog, Outcome, ReadMode};
pub use persona::{Persona, PersonaBook, PersonaProfile, PersonalityType};
pub use report::{EffectivenessTimeline, ImpactDistribution, SummaryReport};
pub use scoring::{Analysis, Dimension};
pub use selector::{NudgeType, Strategy, StrategySelector};
pub use simulator::{TelemetryGenerator, UserOutcomeSimulator};
pub use storage::{data_dir, Config};
pub use timing::{SmartTiming, TimingBlock};
