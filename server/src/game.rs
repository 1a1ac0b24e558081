use log::{debug, info};
use rand::Rng;
use shared::{
    clamp_paddle, paddle_catches, Direction, Snapshot, Square, FALL_SPEED, INITIAL_LIVES,
    PADDLE_STEP, PADDLE_WIDTH, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, SPAWN_INTERVAL_TICKS,
    SPAWN_Y_MIN, SQUARE_SIZE,
};

/// Authoritative session state: one global game per server process.
///
/// Owned exclusively by the tick loop; control input and broadcast both go
/// through it on the loop's single-threaded cadence.
#[derive(Debug, Clone)]
pub struct GameState {
    pub tick: u64,
    pub paddle_x: i32,
    pub squares: Vec<Square>,
    pub score: u32,
    pub lives: u32,
    pub game_over: bool,
    next_square_id: u32,
    ticks_until_spawn: u32,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            paddle_x: (PLAYFIELD_WIDTH - PADDLE_WIDTH) / 2,
            squares: Vec::new(),
            score: 0,
            lives: INITIAL_LIVES,
            game_over: false,
            next_square_id: 0,
            ticks_until_spawn: SPAWN_INTERVAL_TICKS,
        }
    }

    /// Applies one directional control message, clamped to the playfield.
    /// Controls are ignored while the game is over; the paddle stays frozen
    /// until a restart.
    pub fn apply_control(&mut self, direction: Direction) {
        if self.game_over {
            return;
        }
        let step = match direction {
            Direction::Left => -PADDLE_STEP,
            Direction::Right => PADDLE_STEP,
        };
        self.paddle_x = clamp_paddle(self.paddle_x + step);
    }

    /// Advances the simulation one tick: spawn, fall, catch/miss resolution,
    /// game-over transition. Frozen entirely while the game is over.
    pub fn step<R: Rng>(&mut self, rng: &mut R) {
        if self.game_over {
            return;
        }
        self.tick += 1;

        self.ticks_until_spawn -= 1;
        if self.ticks_until_spawn == 0 {
            self.ticks_until_spawn = SPAWN_INTERVAL_TICKS;
            let x = rng.gen_range(0..PLAYFIELD_WIDTH - SQUARE_SIZE);
            let y = rng.gen_range(SPAWN_Y_MIN..-SQUARE_SIZE);
            self.spawn_square(x, y);
        }

        for square in &mut self.squares {
            square.y += FALL_SPEED;
        }

        // Each square resolves independently; catch/miss order within a tick
        // cannot change the resulting score or lives.
        let paddle_x = self.paddle_x;
        let mut caught = 0u32;
        let mut missed = 0u32;
        self.squares.retain(|square| {
            if paddle_catches(paddle_x, square) {
                caught += 1;
                false
            } else if square.y > PLAYFIELD_HEIGHT {
                missed += 1;
                false
            } else {
                true
            }
        });

        self.score += caught;
        if missed > 0 {
            self.lives = self.lives.saturating_sub(missed);
            debug!("Missed {} square(s), {} lives remaining", missed, self.lives);
        }

        if self.lives == 0 {
            self.game_over = true;
            info!("Game over at tick {} with score {}", self.tick, self.score);
        }
    }

    /// Inserts a new square at the given position. Exposed so tests can
    /// script exact scenarios; the tick loop spawns through `step`.
    pub fn spawn_square(&mut self, x: i32, y: i32) -> u32 {
        self.next_square_id += 1;
        let id = self.next_square_id;
        self.squares.push(Square { id, x, y });
        id
    }

    /// Resets the session to its starting values: lives restored, score
    /// zeroed, squares cleared, paddle recentered, game-over flag cleared.
    pub fn restart(&mut self) {
        info!("Restarting game (final score was {})", self.score);
        *self = GameState::new();
    }

    /// Serializable view of the full session state for this tick's broadcast.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            paddle_x: self.paddle_x,
            squares: self.squares.clone(),
            score: self.score,
            lives: self.lives,
            game_over: self.game_over,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
