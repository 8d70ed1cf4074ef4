//! Deterministic simulation module
//!
//! All board logic lives here. This module must be pure and deterministic:
//! - Step-based physics only (no wall-clock inside a step)
//! - Seeded RNG only, one stream per ball
//! - Stable iteration order (by ball ID)
//! - No rendering or platform dependencies

pub mod ball;
pub mod board;
pub mod simulation;
pub mod timer;

pub use ball::{Ball, Physics, ball_rng};
pub use board::BoardParams;
pub use simulation::{FrameReport, RunPhase, Simulation, SpawnOutcome};
pub use timer::SpawnTimer;
