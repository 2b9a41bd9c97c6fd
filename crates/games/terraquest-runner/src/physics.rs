use serde::{Deserialize, Serialize};

use terraquest_core::events::SimEvent;
use terraquest_core::progress::{Tally, UpgradeStats};

use crate::config::{PhysicsConfig, RunnerConfig, WorldConfig};
use crate::grid::{Tile, TileGrid};

/// Axis-aligned rectangle in screen pixels (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Strict overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn shifted(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// The player-controlled actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub x: i32,
    pub y: i32,
    pub vy: i32,
    pub grounded: bool,
    pub facing: Facing,
    pub moving: bool,
    /// Fractional animation frame; the renderer truncates it.
    pub frame: f32,
    /// Leftmost x the actor may walk back to in the current chunk.
    pub start_x: i32,
    pub size: i32,
    /// Latched once the right edge passes the exhaustion threshold.
    pub past_chunk_end: bool,
}

impl Actor {
    pub fn new(config: &RunnerConfig) -> Self {
        let start_x = config.world.chunk_start_x();
        Self {
            x: start_x,
            y: 0,
            vy: config.physics.initial_vy,
            grounded: true,
            facing: Facing::Right,
            moving: false,
            frame: 0.0,
            start_x,
            size: config.physics.actor_size as i32,
            past_chunk_end: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.size, self.size)
    }

    /// Put the actor back at the chunk-start offset, keeping height and velocity.
    pub fn reset_to_chunk_start(&mut self) {
        self.x = self.start_x;
        self.past_chunk_end = false;
    }
}

/// Per-tick input intents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intents {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
}

/// Directions the actor may move this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocking {
    pub can_move_left: bool,
    pub can_move_right: bool,
}

impl Default for Blocking {
    fn default() -> Self {
        Self {
            can_move_left: true,
            can_move_right: true,
        }
    }
}

/// Outcome of resolving one tick against the grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub blocking: Blocking,
    pub events: Vec<SimEvent>,
    pub chunk_exhausted: bool,
}

fn tile_rect(col: i32, row: i32, tile_size: i32) -> Rect {
    Rect::new(col * tile_size, row * tile_size, tile_size, tile_size)
}

/// Grid cells near the actor: its rect grown by the horizontal speed and
/// the vertical velocity, clamped to the grid.
fn scan_window(
    actor: &Actor,
    grid: &TileGrid,
    speed: i32,
    tile_size: i32,
) -> impl Iterator<Item = (i32, i32)> + use<> {
    let rect = actor.rect();
    let reach_y = actor.vy.abs() + 1;
    let min_col = (rect.left() - speed).div_euclid(tile_size).max(0);
    let max_col = (rect.right() + speed).div_euclid(tile_size).min(grid.width() as i32 - 1);
    let min_row = (rect.top() - reach_y).div_euclid(tile_size).max(0);
    let max_row = (rect.bottom() + reach_y).div_euclid(tile_size).min(grid.height() as i32 - 1);
    (min_row..=max_row).flat_map(move |row| (min_col..=max_col).map(move |col| (col, row)))
}

/// Resolve the actor against the grid for one tick.
///
/// Order: the chunk-exhaustion latch, then landing against surface tiles
/// using the pre-snap rect followed by the resting-support check, then
/// horizontal blocking and entity pickups against the post-snap rect.
/// Collected entities and triggered spikes are written back to `grid`.
pub fn resolve(
    actor: &mut Actor,
    grid: &mut TileGrid,
    stats: &UpgradeStats,
    tally: &mut Tally,
    world: &WorldConfig,
) -> Resolution {
    let mut out = Resolution::default();
    let ts = world.tile_size as i32;
    let speed = stats.speed as i32;

    let right = actor.rect().right();
    let threshold = world.exhaust_threshold_px();
    if right > threshold {
        if !actor.past_chunk_end {
            actor.past_chunk_end = true;
            out.chunk_exhausted = true;
            out.events.push(SimEvent::ChunkExhausted);
        }
    } else {
        actor.past_chunk_end = false;
    }

    let cells: Vec<(i32, i32)> = scan_window(actor, grid, speed, ts).collect();

    // Vertical pass
    actor.grounded = false;
    let start = actor.rect();
    for &(col, row) in &cells {
        if !grid.get(col, row).is_surface() {
            continue;
        }
        let tile = tile_rect(col, row, ts);
        if actor.vy > 0 && start.intersects(&tile) && !start.shifted(0, -actor.vy).intersects(&tile) {
            actor.y = tile.top() - actor.size;
            actor.vy = 0;
            actor.grounded = true;
        }
    }

    let rect = actor.rect();
    if !actor.grounded && actor.vy >= 0 {
        let supported = cells.iter().any(|&(col, row)| {
            let tile = tile_rect(col, row, ts);
            grid.get(col, row).is_surface()
                && tile.top() == rect.bottom()
                && rect.left() < tile.right()
                && tile.left() < rect.right()
        });
        if supported {
            actor.vy = 0;
            actor.grounded = true;
        }
    }

    // Horizontal and entity pass
    for &(col, row) in &cells {
        let tile = grid.get(col, row);
        let bounds = tile_rect(col, row, ts);
        if tile.is_empty() || !rect.intersects(&bounds) {
            continue;
        }
        let (column, row_u) = (col as u32, row as u32);
        match tile {
            Tile::Border(_) => {
                if bounds.left() <= rect.right()
                    && rect.right() < bounds.right()
                    && !rect.shifted(-speed, 0).intersects(&bounds)
                {
                    out.blocking.can_move_right = false;
                }
                if rect.left() <= bounds.right()
                    && bounds.left() < rect.left()
                    && !rect.shifted(speed, 0).intersects(&bounds)
                {
                    out.blocking.can_move_left = false;
                }
            },
            Tile::Coin => {
                tally.collect_coin();
                grid.set(column, row_u, Tile::Empty);
                out.events.push(SimEvent::CoinCollected { column, row: row_u });
            },
            Tile::Gem => {
                tally.collect_gem();
                grid.set(column, row_u, Tile::Empty);
                out.events.push(SimEvent::GemCollected { column, row: row_u });
            },
            Tile::Spike => {
                let (coins_lost, gems_lost) = tally.apply_hazard(stats);
                grid.set(column, row_u, Tile::SpentSpike);
                tracing::debug!(column, row = row_u, coins_lost, gems_lost, "Spike hit");
                out.events.push(SimEvent::SpikeHit {
                    column,
                    row: row_u,
                    coins_lost,
                    gems_lost,
                });
            },
            Tile::SpentSpike | Tile::Decor(_) | Tile::Empty => {},
        }
    }

    out
}

/// Apply intents, gravity and the screen clamps.
pub fn move_actor(
    actor: &mut Actor,
    intents: &Intents,
    blocking: &Blocking,
    stats: &UpgradeStats,
    config: &RunnerConfig,
) {
    let speed = stats.speed as i32;
    let chunk_w = config.world.chunk_width_px();
    actor.moving = false;

    if intents.move_left && actor.x > actor.start_x && blocking.can_move_left {
        actor.x -= speed;
        actor.facing = Facing::Left;
        actor.moving = true;
    } else if intents.move_right && actor.x < chunk_w && blocking.can_move_right {
        actor.x += speed;
        actor.facing = Facing::Right;
        actor.moving = true;
    }

    if intents.jump && actor.grounded {
        actor.vy = -(stats.jump_power as i32);
        actor.grounded = false;
    }

    actor.y += actor.vy;
    actor.vy += config.physics.gravity;

    actor.x = actor.x.clamp(0, chunk_w - actor.size);
    actor.y = actor.y.clamp(0, config.world.viewport_height as i32 - actor.size);
}

/// Step the walk cycle while moving; idle actors show the standing frame.
pub fn advance_animation(actor: &mut Actor, physics: &PhysicsConfig) {
    if actor.moving {
        actor.frame += physics.animation_step;
        if actor.frame >= physics.animation_frames as f32 {
            actor.frame = 0.0;
        }
    } else {
        actor.frame = 0.0;
    }
}
