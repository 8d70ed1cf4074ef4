//! Galton Board - a bean machine simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board geometry, ball physics, bin accumulation)
//! - `stats`: Binomial expectation and histogram statistics
//! - `renderer`: Scene building and canvas 2D drawing
//! - `config`: Run parameters and their persistence

pub mod config;
pub mod renderer;
pub mod sim;
pub mod stats;

pub use config::{CollisionPolicy, ConfigError, SimConfig};
pub use sim::{BoardParams, Simulation};

/// Simulation constants (pixels, simulation steps)
pub mod consts {
    /// Peg radius
    pub const PIN_RADIUS: f32 = 4.0;
    /// Distance from the canvas top to the first peg row
    pub const TOP_PADDING: f32 = 40.0;
    /// Left/right margin used when sizing the peg spacing
    pub const HORIZONTAL_PADDING: f32 = 40.0;
    /// Share of the canvas height taken by the peg rows
    pub const PEG_AREA_RATIO: f32 = 0.8;
    /// Gap between the last peg row and the top of the bins
    pub const BIN_TOP_GAP: f32 = 20.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 5.0;
    pub const BALL_SPAWN_Y: f32 = 20.0;
    /// Horizontal spread of the spawn point around the canvas center
    pub const BALL_SPAWN_JITTER: f32 = 5.0;
    /// Downward acceleration per step
    pub const GRAVITY: f32 = 0.1;

    /// Horizontal speed decay once below the last peg row
    pub const FREE_FALL_DRAG: f32 = 0.98;
    /// Share of velocity kept when a ball touches a peg
    pub const CONTACT_DAMPING: f32 = 0.1;
    /// Upper bound on peg contacts per row before the ball moves on
    pub const MAX_CONTACTS_PER_ROW: u8 = 8;
    /// Row-kick variant: horizontal speed set on every row crossing
    pub const ROW_KICK_SPEED: f32 = 1.5;
    /// Row-kick variant: vertical bounce factor on every row crossing
    pub const ROW_KICK_BOUNCE: f32 = -0.3;

    /// Base spawn period in milliseconds at speed 1
    pub const SPAWN_PERIOD_MS: f64 = 50.0;
    /// Fraction of the run expected in the busiest bin (sizes the bars)
    pub const BUSIEST_BIN_SHARE: f32 = 0.35;
    /// Fraction of the space below the pegs used by the bars
    pub const BAR_AREA_RATIO: f32 = 0.9;

    /// Upper bounds accepted from the UI
    pub const MAX_ROWS: u32 = 60;
    pub const MAX_SPEED: u32 = 100;
}
