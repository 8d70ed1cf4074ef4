//! Simulation state and frame loop
//!
//! `Simulation` owns everything that changes during a run: the live balls,
//! the bin counts, the spawn timer and the board geometry. The frame driver
//! (browser animation frame or the headless runner) calls [`Simulation::advance`]
//! once per frame with the elapsed time.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, Physics, ball_rng};
use super::board::BoardParams;
use super::timer::SpawnTimer;
use crate::config::SimConfig;
use crate::stats::BinStats;

/// Seed used when the configuration does not provide one
pub const DEFAULT_SEED: u64 = 0x6a17_0b0a_7d5e_ed01;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Empty board, nothing scheduled
    Idle,
    /// Spawning and/or animating balls
    Running,
    /// Halted by the user; balls and counts kept
    Stopped,
    /// Every requested ball has landed
    Settled,
}

/// Result of one spawn timer firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// A ball with this ID entered the board
    Spawned(u32),
    /// All requested balls were already dropped; the timer is now disarmed
    QuotaReached,
}

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub spawned: u32,
    pub landed: u32,
    /// The run is settled after this frame
    pub settled: bool,
}

/// A live ball and its private RNG stream
#[derive(Debug, Clone)]
struct FallingBall {
    ball: Ball,
    rng: Pcg32,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    seed: u64,
    board: BoardParams,
    /// Live balls in spawn (ID) order
    balls: Vec<FallingBall>,
    bin_counts: Vec<u32>,
    /// Bar height of one ball, fixed at start
    one_ball_height: f32,
    /// Balls requested for the current run
    requested: u32,
    /// Balls spawned so far in the current run
    dropped: u32,
    spawn_timer: SpawnTimer,
    phase: RunPhase,
    /// Frames advanced in the current run
    frames: u64,
}

impl Simulation {
    pub fn new(config: SimConfig, width: f32, height: f32) -> Self {
        let config = config.sanitized();
        let board = BoardParams::new(width, height, config.rows);
        Self {
            seed: config.seed.unwrap_or(DEFAULT_SEED),
            bin_counts: vec![0; board.num_bins],
            spawn_timer: SpawnTimer::new(config.speed),
            board,
            config,
            balls: Vec::new(),
            one_ball_height: 0.0,
            requested: 0,
            dropped: 0,
            phase: RunPhase::Idle,
            frames: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn board(&self) -> &BoardParams {
        &self.board
    }

    pub fn bin_counts(&self) -> &[u32] {
        &self.bin_counts
    }

    pub fn one_ball_height(&self) -> f32 {
        self.one_ball_height
    }

    /// Live balls in spawn order
    pub fn balls(&self) -> impl Iterator<Item = &Ball> + '_ {
        self.balls.iter().map(|b| &b.ball)
    }

    pub fn live_count(&self) -> usize {
        self.balls.len()
    }

    pub fn requested(&self) -> u32 {
        self.requested
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Balls of the current run not yet spawned
    pub fn pending(&self) -> u32 {
        self.requested - self.dropped
    }

    /// Balls counted into bins so far
    pub fn landed(&self) -> u64 {
        self.bin_counts.iter().map(|&c| c as u64).sum()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn spawn_timer(&self) -> &SpawnTimer {
        &self.spawn_timer
    }

    /// Seed for the next run (ignored while the config pins one)
    pub fn set_seed(&mut self, seed: u64) {
        if self.config.seed.is_none() {
            self.seed = seed;
        }
    }

    fn physics(&self) -> Physics {
        Physics {
            policy: self.config.policy,
            wall_bounce: self.config.wall_bounce,
        }
    }

    fn rebuild_board(&mut self) {
        self.board = BoardParams::new(self.board.width, self.board.height, self.config.rows);
    }

    /// Begin a fresh run with the configured rows, balls and speed
    pub fn start(&mut self) {
        self.reset();
        self.requested = self.config.balls;
        self.one_ball_height = self.board.one_ball_height(self.requested);
        self.spawn_timer.arm();
        self.phase = RunPhase::Running;
        log::info!(
            "Run started: {} balls, {} rows, speed {}x, seed {}",
            self.requested,
            self.config.rows,
            self.config.speed,
            self.seed
        );
    }

    /// Halt spawning and animation, keeping the current state
    pub fn stop(&mut self) {
        self.spawn_timer.disarm();
        if self.phase == RunPhase::Running {
            self.phase = RunPhase::Stopped;
        }
    }

    /// Stop and return to an empty board
    pub fn reset(&mut self) {
        self.stop();
        self.balls.clear();
        self.rebuild_board();
        self.bin_counts = vec![0; self.board.num_bins];
        self.one_ball_height = 0.0;
        self.requested = 0;
        self.dropped = 0;
        self.frames = 0;
        self.phase = RunPhase::Idle;
    }

    /// New canvas size; the run continues on the new geometry
    pub fn resize(&mut self, width: f32, height: f32) {
        self.board = BoardParams::new(width, height, self.config.rows);
    }

    /// Changing the row count discards the current run
    pub fn set_rows(&mut self, rows: u32) {
        self.config.rows = rows;
        self.resanitize();
        self.reset();
    }

    /// Clamp a changed setting (with the same warnings as a loaded config)
    fn resanitize(&mut self) {
        self.config = std::mem::take(&mut self.config).sanitized();
    }

    /// Ball total for the next run
    pub fn set_balls(&mut self, balls: u32) {
        self.config.balls = balls;
    }

    /// Physics sub-steps per frame; also rescales the spawn period
    pub fn set_speed(&mut self, speed: u32) {
        self.config.speed = speed;
        self.resanitize();
        self.spawn_timer.set_speed(self.config.speed);
    }

    pub fn set_show_expected(&mut self, show: bool) {
        self.config.show_expected = show;
    }

    /// One firing of the spawn timer
    pub fn spawn_tick(&mut self) -> SpawnOutcome {
        if self.dropped >= self.requested {
            self.spawn_timer.disarm();
            log::debug!("Spawn quota of {} reached", self.requested);
            return SpawnOutcome::QuotaReached;
        }

        let id = self.dropped;
        let mut rng = ball_rng(self.seed, id);
        let ball = Ball::spawn(id, &self.board, &mut rng);
        self.balls.push(FallingBall { ball, rng });
        self.dropped += 1;

        if self.dropped == self.requested {
            self.spawn_timer.disarm();
            log::debug!("Spawn quota of {} reached", self.requested);
        }
        SpawnOutcome::Spawned(id)
    }

    /// Move every live ball one step and bin the ones that left the board
    ///
    /// Returns the number of balls that landed.
    pub fn physics_step(&mut self) -> u32 {
        let physics = self.physics();
        let board = &self.board;
        for falling in &mut self.balls {
            falling.ball.step(board, &physics, &mut falling.rng);
        }

        let counts = &mut self.bin_counts;
        let mut landed = 0;
        self.balls.retain(|falling| {
            if !falling.ball.has_landed(board) {
                return true;
            }
            if let Some(count) = counts.get_mut(board.bin_index(falling.ball.pos.x)) {
                *count += 1;
            }
            landed += 1;
            false
        });
        landed
    }

    /// Every requested ball has been spawned and has landed
    pub fn is_settled(&self) -> bool {
        self.dropped >= self.requested && self.balls.is_empty()
    }

    /// Advance one animation frame of `dt_ms` milliseconds
    ///
    /// Fires the spawn timer for each elapsed period, then runs `speed`
    /// physics sub-steps. Does nothing unless the run is active.
    pub fn advance(&mut self, dt_ms: f64) -> FrameReport {
        if self.phase != RunPhase::Running {
            return FrameReport {
                settled: self.phase == RunPhase::Settled,
                ..Default::default()
            };
        }

        let mut report = FrameReport::default();
        for _ in 0..self.spawn_timer.advance(dt_ms) {
            match self.spawn_tick() {
                SpawnOutcome::Spawned(_) => report.spawned += 1,
                SpawnOutcome::QuotaReached => break,
            }
        }

        for _ in 0..self.config.speed {
            report.landed += self.physics_step();
        }
        self.frames += 1;

        if !self.spawn_timer.is_armed() && self.is_settled() {
            self.phase = RunPhase::Settled;
            log::info!(
                "Run settled after {} frames: {}",
                self.frames,
                BinStats::from_counts(&self.bin_counts)
            );
        }
        report.settled = self.phase == RunPhase::Settled;
        report
    }

    /// Drive frames of `dt_ms` until the run settles
    ///
    /// Returns the number of frames taken, or `None` if the run is not active
    /// or did not settle within `max_frames`.
    pub fn run_until_settled(&mut self, dt_ms: f64, max_frames: u64) -> Option<u64> {
        if self.phase == RunPhase::Settled {
            return Some(self.frames);
        }
        while self.phase == RunPhase::Running && self.frames < max_frames {
            if self.advance(dt_ms).settled {
                return Some(self.frames);
            }
        }
        None
    }

    /// Statistics of the counts so far
    pub fn stats(&self) -> BinStats {
        BinStats::from_counts(&self.bin_counts)
    }
}
