use serde::{Deserialize, Serialize};

pub const PLAYFIELD_WIDTH: i32 = 800;
pub const PLAYFIELD_HEIGHT: i32 = 600;
pub const PADDLE_WIDTH: i32 = 100;
pub const PADDLE_HEIGHT: i32 = 20;
pub const PADDLE_BOTTOM_MARGIN: i32 = 10;
pub const PADDLE_STEP: i32 = 8;
pub const SQUARE_SIZE: i32 = 30;
pub const FALL_SPEED: i32 = 3;
pub const INITIAL_LIVES: u32 = 3;
pub const DEFAULT_TICK_RATE: u32 = 60;
/// Ticks between spawns; one square per second at the default tick rate.
pub const SPAWN_INTERVAL_TICKS: u32 = 60;
/// Squares spawn with y uniform in [SPAWN_Y_MIN, -SQUARE_SIZE), above the field.
pub const SPAWN_Y_MIN: i32 = -100;

/// Top edge of the band the paddle occupies. The paddle only ever moves
/// horizontally; its vertical placement is fixed near the bottom edge.
pub const fn paddle_y() -> i32 {
    PLAYFIELD_HEIGHT - PADDLE_BOTTOM_MARGIN - PADDLE_HEIGHT
}

/// A falling square in server-space coordinates.
///
/// The `id` is a monotonic spawn counter so clients can track an individual
/// square across snapshots.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Square {
    pub id: u32,
    pub x: i32,
    pub y: i32,
}

/// Full session state as broadcast to every client once per tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub paddle_x: i32,
    pub squares: Vec<Square>,
    pub score: u32,
    pub lives: u32,
    pub game_over: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdminCommand {
    Restart,
}

/// Inbound message from a client. Frames whose `type` tag is unknown fail to
/// parse and are dropped by the server without further effect.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Control { direction: Direction },
    Admin { command: AdminCommand },
}

/// Inclusive axis-aligned overlap between a square and the paddle band.
///
/// Touching edges count as a catch, so a square that grazes the paddle's
/// exact boundary is never an unfair miss.
pub fn paddle_catches(paddle_x: i32, square: &Square) -> bool {
    let overlap_x = square.x <= paddle_x + PADDLE_WIDTH && paddle_x <= square.x + SQUARE_SIZE;
    let overlap_y =
        square.y <= paddle_y() + PADDLE_HEIGHT && paddle_y() <= square.y + SQUARE_SIZE;
    overlap_x && overlap_y
}

/// Clamps a paddle position to the playfield.
pub fn clamp_paddle(x: i32) -> i32 {
    x.clamp(0, PLAYFIELD_WIDTH - PADDLE_WIDTH)
}
