//! Ball entity and its per-step update rule
//!
//! A ball's progress through the board is tracked by `current_row`: the next
//! peg row it has not yet passed. Every row crossing injects a random
//! horizontal perturbation; summed over all rows this gives the binomial
//! spread of a Galton board.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::board::BoardParams;
use crate::consts::*;

/// How a ball reacts when it reaches a peg row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Test the ball against the nearest peg of the row and bounce off it on
    /// contact. The row is only passed once the ball is clear of its pegs.
    #[default]
    PegContact,
    /// Pass the row unconditionally with a random left/right kick.
    RowKick,
}

impl CollisionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::PegContact => "peg_contact",
            CollisionPolicy::RowKick => "row_kick",
        }
    }
}

/// Physics switches shared by every ball of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Physics {
    pub policy: CollisionPolicy,
    /// Reflect horizontal velocity at the canvas edges
    pub wall_bounce: bool,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            policy: CollisionPolicy::PegContact,
            wall_bounce: true,
        }
    }
}

/// RNG stream for one ball
///
/// Streams are keyed by ball ID so a ball's path does not depend on how many
/// other balls are in flight or how sub-steps are grouped into frames.
pub fn ball_rng(seed: u64, ball_id: u32) -> Pcg32 {
    Pcg32::new(seed, ball_id as u64)
}

/// A falling ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub gravity: f32,
    /// Next peg row not yet passed (`rows` once below the last row)
    pub current_row: u32,
    /// Peg contacts on `current_row` so far
    #[serde(default)]
    pub row_contacts: u8,
    /// Where the ball was deflected to on `current_row`: half a spacing left
    /// or right of the peg it reached, i.e. a peg of the next row
    #[serde(default)]
    pub target_x: Option<f32>,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            gravity: GRAVITY,
            current_row: 0,
            row_contacts: 0,
            target_x: None,
        }
    }

    /// Create a ball above the top peg with a little horizontal jitter
    pub fn spawn<R: Rng + ?Sized>(id: u32, board: &BoardParams, rng: &mut R) -> Self {
        let jitter = BALL_SPAWN_JITTER.min(board.horizontal_spacing);
        let x = board.width / 2.0 + (rng.random::<f32>() - 0.5) * jitter;
        Self::new(id, Vec2::new(x, BALL_SPAWN_Y))
    }

    /// Whether the ball has dropped out of the bottom of the canvas
    #[inline]
    pub fn has_landed(&self, board: &BoardParams) -> bool {
        self.pos.y >= board.height
    }

    /// Advance the ball by one simulation step
    pub fn step<R: Rng + ?Sized>(&mut self, board: &BoardParams, physics: &Physics, rng: &mut R) {
        self.vel.y += self.gravity;
        self.pos += self.vel;

        if physics.wall_bounce {
            self.bounce_off_walls(board.width);
        }

        if self.current_row >= board.rows {
            // Below the pegs: settle straight down into the bin
            self.vel.x *= FREE_FALL_DRAG;
            return;
        }

        let row_y = board.row_y(self.current_row);
        if self.pos.y + self.radius > row_y {
            match physics.policy {
                CollisionPolicy::PegContact => self.resolve_peg_contact(board, rng),
                CollisionPolicy::RowKick => self.row_kick(rng),
            }
        }
    }

    fn bounce_off_walls(&mut self, width: f32) {
        if self.pos.x - self.radius < 0.0 {
            self.vel.x = self.vel.x.abs();
        } else if self.pos.x + self.radius > width {
            self.vel.x = -self.vel.x.abs();
        }
    }

    fn advance_row(&mut self) {
        self.current_row += 1;
        self.row_contacts = 0;
        self.target_x = None;
    }

    fn row_kick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.vel.x = random_sign(rng) * ROW_KICK_SPEED;
        self.vel.y *= ROW_KICK_BOUNCE;
        self.advance_row();
    }

    fn resolve_peg_contact<R: Rng + ?Sized>(&mut self, board: &BoardParams, rng: &mut R) {
        let Some(peg) = board.nearest_peg(self.current_row, self.pos.x) else {
            self.advance_row();
            return;
        };

        // One coin flip per row, made on arrival and kept for every contact
        let target_x = match self.target_x {
            Some(x) => x,
            None => {
                let x = peg.x + random_sign(rng) * board.horizontal_spacing / 2.0;
                self.target_x = Some(x);
                x
            }
        };
        let next_row = self.current_row + 1;

        let reach = self.radius + board.pin_radius;
        let offset = self.pos - peg;
        let dist = offset.length();
        if dist >= reach || self.row_contacts >= MAX_CONTACTS_PER_ROW {
            // Clear of the row, touched or not: head for the chosen peg below
            self.advance_row();
            self.steer_to(target_x, next_row, board);
            return;
        }
        self.row_contacts += 1;

        // Coincident centers have no direction to push along
        let normal = if dist > f32::EPSILON {
            offset / dist
        } else {
            Vec2::from_angle(rng.random_range(0.0..TAU))
        };

        let hop = -rng.random_range(0.0..0.5);
        self.vel.y = self.vel.y * CONTACT_DAMPING + hop;
        self.pos += normal * (reach - dist);
        self.steer_to(target_x, next_row, board);
    }

    /// Set vx so the ball is at `target_x` when it reaches `next_row`, or when
    /// it leaves the canvas if `next_row` is past the last peg row
    ///
    /// Uses the ball's current vertical speed, so a ball that skipped a peg
    /// and kept falling fast is pulled back onto the peg lattice.
    fn steer_to(&mut self, target_x: f32, next_row: u32, board: &BoardParams) {
        let dx = target_x - self.pos.x;
        let (drop, below_pegs) = if next_row < board.rows {
            (board.row_y(next_row) - self.radius - self.pos.y, false)
        } else {
            (board.height - self.pos.y, true)
        };

        let Some(steps) = steps_to_fall(drop, self.vel.y, self.gravity) else {
            self.vel.x = ROW_KICK_SPEED.copysign(dx);
            return;
        };
        let travel = if below_pegs {
            // Sum of vx over `steps` steps of free-fall drag
            (1.0 - FREE_FALL_DRAG.powf(steps)) / (1.0 - FREE_FALL_DRAG)
        } else {
            steps
        };
        self.vel.x = dx / travel;
    }
}

fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    if rng.random_bool(0.5) { 1.0 } else { -1.0 }
}

/// Steps until a ball moving down at `vy` and gaining `gravity` per step has
/// dropped more than `drop`
///
/// After `n` steps the ball has dropped `n·vy + gravity·n(n+1)/2`. `None` when
/// it never gets there.
fn steps_to_fall(drop: f32, vy: f32, gravity: f32) -> Option<f32> {
    if drop <= 0.0 {
        return Some(1.0);
    }
    let steps = if gravity > 0.0 {
        let b = vy + gravity / 2.0;
        (-b + (b * b + 2.0 * gravity * drop).sqrt()) / gravity
    } else if vy > 0.0 {
        drop / vy
    } else {
        return None;
    };
    Some(steps.floor() + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> BoardParams {
        BoardParams::new(880.0, 500.0, 8)
    }

    #[test]
    fn test_gravity_then_integrate() {
        let board = board();
        let mut rng = ball_rng(1, 1);
        let mut ball = Ball::new(1, Vec2::new(100.0, 0.0));
        ball.step(&board, &Physics::default(), &mut rng);
        assert_eq!(ball.vel, Vec2::new(0.0, GRAVITY));
        assert_eq!(ball.pos, Vec2::new(100.0, GRAVITY));
        assert_eq!(ball.current_row, 0);
    }

    #[test]
    fn test_spawn_near_center() {
        let board = board();
        let mut rng = ball_rng(7, 3);
        for id in 0..50 {
            let ball = Ball::spawn(id, &board, &mut rng);
            assert!((ball.pos.x - 440.0).abs() <= BALL_SPAWN_JITTER / 2.0);
            assert_eq!(ball.pos.y, BALL_SPAWN_Y);
            assert_eq!(ball.vel, Vec2::ZERO);
        }
    }

    #[test]
    fn test_peg_contact_pushes_ball_out() {
        let board = board();
        let physics = Physics::default();
        let mut rng = ball_rng(42, 0);
        let peg = board.nearest_peg(0, 440.0).unwrap();

        // Ball resting slightly up-left of the top peg
        let mut ball = Ball::new(0, peg + Vec2::new(-2.0, -4.0));
        ball.gravity = 0.0;
        ball.step(&board, &physics, &mut rng);

        let reach = ball.radius + board.pin_radius;
        assert!((ball.pos.distance(peg) - reach).abs() < 1e-3);
        assert_eq!(ball.current_row, 0, "a contact does not pass the row");
        assert_eq!(ball.row_contacts, 1);
        assert!(ball.vel.x != 0.0);
    }

    #[test]
    fn test_coincident_centers_get_random_direction() {
        let board = board();
        let physics = Physics::default();
        let mut rng = ball_rng(5, 5);
        let peg = board.nearest_peg(0, 440.0).unwrap();

        let mut ball = Ball::new(0, peg);
        ball.gravity = 0.0;
        ball.step(&board, &physics, &mut rng);

        assert!(ball.pos.is_finite());
        assert!(ball.vel.is_finite());
        let reach = ball.radius + board.pin_radius;
        assert!((ball.pos.distance(peg) - reach).abs() < 1e-3);
    }

    #[test]
    fn test_miss_passes_row_and_steers_to_next_row() {
        let board = board();
        let physics = Physics::default();
        let mut rng = ball_rng(5, 5);
        // Row 0 has a single peg at x = 440; this ball is far to the side and
        // already falling fast
        let mut ball = Ball::new(0, Vec2::new(300.0, board.row_y(0) - 4.0));
        ball.vel = Vec2::new(-3.0, 4.0);
        ball.step(&board, &physics, &mut rng);
        assert_eq!(ball.current_row, 1);
        assert!(ball.vel.x > 0.0, "steered back toward the pegs");

        // It arrives at row 1 on one of that row's pegs
        while ball.pos.y + ball.radius <= board.row_y(1) {
            ball.step(&board, &physics, &mut rng);
        }
        let peg = board.nearest_peg(1, ball.pos.x).unwrap();
        assert!((ball.pos.x - peg.x).abs() < 1.0, "x = {}, peg at {}", ball.pos.x, peg.x);
    }

    #[test]
    fn test_contact_limit_forces_progress() {
        let board = board();
        let physics = Physics::default();
        let mut rng = ball_rng(9, 9);
        let peg = board.nearest_peg(0, 440.0).unwrap();

        let mut ball = Ball::new(0, peg);
        ball.gravity = 0.0;
        for _ in 0..MAX_CONTACTS_PER_ROW {
            ball.pos = peg;
            ball.vel = Vec2::ZERO;
            ball.step(&board, &physics, &mut rng);
            assert_eq!(ball.current_row, 0);
        }
        ball.pos = peg;
        ball.vel = Vec2::ZERO;
        ball.step(&board, &physics, &mut rng);
        assert_eq!(ball.current_row, 1);
        assert_eq!(ball.row_contacts, 0);
    }

    #[test]
    fn test_row_kick_always_advances() {
        let board = board();
        let physics = Physics {
            policy: CollisionPolicy::RowKick,
            wall_bounce: true,
        };
        let mut rng = ball_rng(3, 1);
        let mut ball = Ball::new(0, Vec2::new(300.0, board.row_y(0) - 4.0));
        ball.vel.y = 2.0;
        ball.step(&board, &physics, &mut rng);

        assert_eq!(ball.current_row, 1);
        assert_eq!(ball.vel.x.abs(), ROW_KICK_SPEED);
        assert!((ball.vel.y - (2.0 + GRAVITY) * ROW_KICK_BOUNCE).abs() < 1e-5);
    }

    #[test]
    fn test_free_fall_drag_below_pegs() {
        let board = board();
        let mut rng = ball_rng(1, 1);
        let mut ball = Ball::new(0, Vec2::new(440.0, 450.0));
        ball.current_row = board.rows;
        ball.vel = Vec2::new(2.0, 1.0);
        ball.step(&board, &Physics::default(), &mut rng);
        assert!((ball.vel.x - 2.0 * FREE_FALL_DRAG).abs() < 1e-6);
        assert_eq!(ball.current_row, board.rows);
    }

    #[test]
    fn test_wall_bounce() {
        let board = board();
        let mut rng = ball_rng(1, 1);
        let mut ball = Ball::new(0, Vec2::new(board.width - 3.0, 450.0));
        ball.current_row = board.rows;
        ball.vel = Vec2::new(2.0, 0.0);
        ball.step(&board, &Physics::default(), &mut rng);
        assert!(ball.vel.x < 0.0);

        let mut ball = Ball::new(1, Vec2::new(board.width - 3.0, 450.0));
        ball.current_row = board.rows;
        ball.vel = Vec2::new(2.0, 0.0);
        let no_walls = Physics {
            wall_bounce: false,
            ..Physics::default()
        };
        ball.step(&board, &no_walls, &mut rng);
        assert!(ball.vel.x > 0.0);
    }

    #[test]
    fn test_steps_to_fall_matches_stepping() {
        for (drop, vy) in [(50.0, 0.0), (50.0, 3.0), (120.0, -0.4), (7.5, 1.0)] {
            let steps = steps_to_fall(drop, vy, GRAVITY).unwrap();
            let (mut y, mut v, mut n) = (0.0f32, vy, 0.0);
            while y <= drop {
                v += GRAVITY;
                y += v;
                n += 1.0;
            }
            assert!((steps - n).abs() <= 1.0, "drop {} vy {}: {} vs {}", drop, vy, steps, n);
        }
        assert_eq!(steps_to_fall(-1.0, 0.0, GRAVITY), Some(1.0));
        assert_eq!(steps_to_fall(10.0, 0.0, 0.0), None);
    }

    #[test]
    fn test_every_ball_lands_on_a_bin_center() {
        // Wide, square, tall and narrow boards, few and many rows
        let boards = [
            BoardParams::new(880.0, 500.0, 8),
            BoardParams::new(800.0, 600.0, 10),
            BoardParams::new(400.0, 800.0, 20),
            BoardParams::new(300.0, 900.0, 40),
            BoardParams::new(800.0, 600.0, 60),
        ];
        let physics = Physics::default();
        for board in &boards {
            for id in 0..40 {
                let mut rng = ball_rng(99, id);
                let mut ball = Ball::spawn(id, board, &mut rng);
                while !ball.has_landed(board) {
                    ball.step(board, &physics, &mut rng);
                }
                let bin = board.bin_index(ball.pos.x);
                let center = board.bin_boundaries[bin] + board.bin_width() / 2.0;
                assert!(
                    (ball.pos.x - center).abs() < board.bin_width() / 4.0,
                    "{} rows on {}x{}: x = {}, bin {} centered at {}",
                    board.rows,
                    board.width,
                    board.height,
                    ball.pos.x,
                    bin,
                    center
                );
            }
        }
    }
}
