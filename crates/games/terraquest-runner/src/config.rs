use serde::{Deserialize, Serialize};

/// Side length of a tile in pixels.
pub const TILE_SIZE: u32 = 18;
/// Viewport width in pixels (two 432 px squares).
pub const VIEWPORT_WIDTH: u32 = 864;
/// Viewport height in pixels.
pub const VIEWPORT_HEIGHT: u32 = 432;
/// Columns in one generated chunk.
pub const CHUNK_COLUMNS: u32 = 400;
/// Actor hitbox side in pixels.
pub const ACTOR_SIZE: u32 = 24;
/// Downward acceleration per tick (screen space, y grows downward).
pub const GRAVITY: i32 = 1;
/// Vertical velocity of a freshly spawned actor.
pub const INITIAL_VY: i32 = 2;
/// Simulation ticks per second.
pub const TICK_RATE_HZ: f32 = 60.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid world geometry: {0}")]
    Geometry(&'static str),
    #[error("probability `{field}` = {value} is outside 0..=1")]
    Probability { field: &'static str, value: f64 },
    #[error("invalid generation range: {0}")]
    Range(&'static str),
}

/// Screen and chunk geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub tile_size: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chunk_columns: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            chunk_columns: CHUNK_COLUMNS,
        }
    }
}

impl WorldConfig {
    /// Grid height: the viewport height in tiles.
    pub fn rows(&self) -> u32 {
        self.viewport_height / self.tile_size
    }

    /// Blank columns reserved at each chunk end: half the viewport in
    /// tiles, doubled.
    pub fn margin_columns(&self) -> u32 {
        let half_view = (self.viewport_width / 2) / self.tile_size;
        half_view * 2
    }

    pub fn chunk_width_px(&self) -> i32 {
        (self.chunk_columns * self.tile_size) as i32
    }

    /// Right-edge x past which the current chunk is exhausted.
    pub fn exhaust_threshold_px(&self) -> i32 {
        self.chunk_width_px() - (self.viewport_width / 2) as i32
    }

    /// Where the actor is placed at the start of every chunk.
    pub fn chunk_start_x(&self) -> i32 {
        (self.viewport_width / 2) as i32
    }
}

/// Probabilities and ranges for the chunk generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub coin_chance: f64,
    pub coin_run_min: u32,
    pub coin_run_max: u32,
    pub gem_chance: f64,
    pub platform_chance: f64,
    /// Relative weight of floating shelves against land masses.
    pub floating_weight: u32,
    pub land_weight: u32,
    pub platform_width_max: u32,
    pub platform_height_max: u32,
    /// Topmost row a floating shelf may occupy.
    pub floating_min_row: u32,
    pub spike_chance: f64,
    pub decor_chance: f64,
    pub decor_variants: u8,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            coin_chance: 0.05,
            coin_run_min: 3,
            coin_run_max: 10,
            gem_chance: 0.04,
            platform_chance: 0.2,
            floating_weight: 1,
            land_weight: 2,
            platform_width_max: 9,
            platform_height_max: 9,
            floating_min_row: 2,
            spike_chance: 0.05,
            decor_chance: 0.5,
            decor_variants: 3,
        }
    }
}

/// Actor physics parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: i32,
    pub actor_size: u32,
    pub initial_vy: i32,
    /// Animation frames advanced per tick while moving.
    pub animation_step: f32,
    pub animation_frames: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            actor_size: ACTOR_SIZE,
            initial_vy: INITIAL_VY,
            animation_step: 0.25,
            animation_frames: 2,
        }
    }
}

/// Top-level runner configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub world: WorldConfig,
    pub generation: GenerationConfig,
    pub physics: PhysicsConfig,
    pub tick_rate_hz: f32,
    /// Fixed generator seed. Unset means a fresh OS seed per run.
    pub seed: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            generation: GenerationConfig::default(),
            physics: PhysicsConfig::default(),
            tick_rate_hz: TICK_RATE_HZ,
            seed: None,
        }
    }
}

impl RunnerConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("TERRAQUEST_CONFIG")
            .unwrap_or_else(|_| "config/terraquest.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                RunnerConfig::default()
            }),
            Err(_) => RunnerConfig::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Seconds per tick.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate_hz
    }

    /// Reject geometry and ranges the generator or resolver cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.world;
        let g = &self.generation;
        if w.tile_size == 0 {
            return Err(ConfigError::Geometry("tile_size must be non-zero"));
        }
        if w.rows() < 6 {
            return Err(ConfigError::Geometry("viewport must be at least 6 tiles tall"));
        }
        if w.margin_columns() * 2 >= w.chunk_columns {
            return Err(ConfigError::Geometry("margins leave no room for content"));
        }
        if self.physics.actor_size == 0 || self.physics.actor_size >= w.viewport_height {
            return Err(ConfigError::Geometry("actor must fit inside the viewport"));
        }
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return Err(ConfigError::Range("tick_rate_hz must be positive"));
        }
        if self.physics.animation_frames == 0 {
            return Err(ConfigError::Geometry("animation_frames must be non-zero"));
        }
        for (field, value) in [
            ("coin_chance", g.coin_chance),
            ("gem_chance", g.gem_chance),
            ("platform_chance", g.platform_chance),
            ("spike_chance", g.spike_chance),
            ("decor_chance", g.decor_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { field, value });
            }
        }
        if g.coin_run_min == 0 || g.coin_run_min > g.coin_run_max {
            return Err(ConfigError::Range("coin run must be a non-empty range starting at 1 or more"));
        }
        if g.coin_run_max >= w.chunk_columns {
            return Err(ConfigError::Range("coin run longer than the chunk"));
        }
        if g.platform_width_max == 0 || g.platform_height_max == 0 {
            return Err(ConfigError::Range("platform dimensions must be non-zero"));
        }
        if g.platform_height_max + 3 > w.rows() {
            return Err(ConfigError::Range("land masses taller than the viewport"));
        }
        if g.floating_min_row > w.rows() - 4 {
            return Err(ConfigError::Range("floating_min_row below the shelf band"));
        }
        if g.floating_weight + g.land_weight == 0 {
            return Err(ConfigError::Range("platform weights must not both be zero"));
        }
        if g.decor_variants == 0 {
            return Err(ConfigError::Range("decor_variants must be non-zero"));
        }
        Ok(())
    }
}
