#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod constants;
pub mod device;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod ranking;
pub mod rng;
pub mod sampler;
pub mod session;
pub mod taunt;

pub use device::{DeviceFilter, DeviceType, PointerSource};
pub use difficulty::{derive_difficulty, DifficultyConfig, DifficultyState};
pub use engine::{EngineConfig, EngineEvent, EnginePhase, EvasionEngine, PointerEvent, TargetState};
pub use error::ParseDeviceTypeError;
pub use geometry::{Point, Size};
pub use ranking::{apply_score, normalize_username, ranking_order, top_scores, RankingEntry, ScoreSubmission};
pub use sampler::sample_position;
pub use session::{GameOutcome, GameSession, PlausibilityPolicy};
