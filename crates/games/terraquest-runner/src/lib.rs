pub mod config;
pub mod grid;
pub mod level_gen;
pub mod physics;
pub mod render;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use terraquest_core::events::{AudioSink, NullAudio, SimEvent};
use terraquest_core::progress::{
    GEM_GOAL, ProgressError, ProgressRecord, ProgressStore, Tally, UpgradeStats,
};
use terraquest_core::terrain::Terrain;

use config::{ConfigError, RunnerConfig};
use grid::TileGrid;
use physics::{Actor, Intents, advance_animation, move_actor, resolve};
use render::{DrawCmd, ThemeTiles, TileAtlas};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] rmp_serde::decode::Error),
}

/// Mutable state of one run. Everything a snapshot captures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub actor: Actor,
    pub tally: Tally,
    pub chunk_index: u32,
    pub tick: u64,
    /// Set once the theme's gem counter has reached the goal.
    pub goal_reached: bool,
    /// Base seed of the run. Chunk `n` is generated from `chunk_rng(seed, n)`,
    /// so a restored snapshot regenerates the same chunks.
    pub seed: u64,
    pub grid: TileGrid,
}

/// Generator for one chunk of a run.
pub fn chunk_rng(seed: u64, chunk_index: u32) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(u64::from(chunk_index)))
}

/// One play session on a single terrain: owns the chunk, the actor and
/// the counters, and advances them one tick at a time.
pub struct RunSession {
    config: RunnerConfig,
    theme: Terrain,
    state: RunState,
    stats: UpgradeStats,
    audio: Box<dyn AudioSink>,
    paused: bool,
}

impl RunSession {
    /// Load progress for `theme` and build the first chunk. Fails on an
    /// invalid config or persisted record; a run never starts from either.
    pub fn start(
        config: RunnerConfig,
        theme: Terrain,
        store: &dyn ProgressStore,
    ) -> Result<Self, SessionError> {
        let (record, seed) = Self::load_record(&config, theme, store)?;
        let grid = level_gen::generate_chunk(&config, &mut chunk_rng(seed, 0));
        Ok(Self::assemble(config, theme, record, seed, grid))
    }

    /// Like [`RunSession::start`], also resolving the theme's render handles
    /// through `atlas`.
    pub fn start_with_atlas<A: TileAtlas>(
        config: RunnerConfig,
        theme: Terrain,
        store: &dyn ProgressStore,
        atlas: &A,
    ) -> Result<(Self, ThemeTiles<A::Handle>), SessionError> {
        let (record, seed) = Self::load_record(&config, theme, store)?;
        let chunk = level_gen::generate(&config, theme, atlas, &mut chunk_rng(seed, 0));
        let session = Self::assemble(config, theme, record, seed, chunk.grid);
        Ok((session, chunk.tiles))
    }

    fn load_record(
        config: &RunnerConfig,
        theme: Terrain,
        store: &dyn ProgressStore,
    ) -> Result<(ProgressRecord, u64), SessionError> {
        config.validate()?;
        let record = store.load(theme)?;
        record
            .stats
            .validate(&format!("{theme} progress"), config.world.tile_size)?;
        let seed = match config.seed {
            Some(seed) => seed,
            None => StdRng::from_os_rng().random(),
        };
        Ok((record, seed))
    }

    fn assemble(
        config: RunnerConfig,
        theme: Terrain,
        record: ProgressRecord,
        seed: u64,
        grid: TileGrid,
    ) -> Self {
        let state = RunState {
            actor: Actor::new(&config),
            tally: record.tally(),
            chunk_index: 0,
            tick: 0,
            goal_reached: record.gems >= GEM_GOAL,
            seed,
            grid,
        };
        tracing::info!(
            %theme,
            coins = record.coins,
            gems = record.gems,
            seed,
            "Run started"
        );
        Self {
            config,
            theme,
            state,
            stats: record.stats,
            audio: Box::new(NullAudio),
            paused: false,
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }

    /// Advance one tick. Returns everything that happened, in order.
    pub fn tick(&mut self, intents: &Intents) -> Vec<SimEvent> {
        if self.paused {
            return Vec::new();
        }
        let state = &mut self.state;
        let resolution = resolve(
            &mut state.actor,
            &mut state.grid,
            &self.stats,
            &mut state.tally,
            &self.config.world,
        );
        move_actor(
            &mut state.actor,
            intents,
            &resolution.blocking,
            &self.stats,
            &self.config,
        );
        advance_animation(&mut state.actor, &self.config.physics);
        state.tick += 1;

        let mut events = resolution.events;
        for cue in events.iter().filter_map(SimEvent::audio_cue) {
            self.audio.play(cue);
        }

        if !state.goal_reached && state.tally.gems >= GEM_GOAL {
            state.goal_reached = true;
            tracing::info!(theme = %self.theme, "Gem goal reached");
            events.push(SimEvent::GoalReached { theme: self.theme });
        }

        if resolution.chunk_exhausted {
            self.advance_chunk();
            events.push(SimEvent::ChunkAdvanced {
                chunk_index: self.state.chunk_index,
            });
        }
        events
    }

    fn advance_chunk(&mut self) {
        self.state.chunk_index += 1;
        let mut rng = chunk_rng(self.state.seed, self.state.chunk_index);
        self.state.grid = level_gen::generate_chunk(&self.config, &mut rng);
        self.state.actor.reset_to_chunk_start();
        tracing::info!(
            chunk = self.state.chunk_index,
            tick = self.state.tick,
            "Advanced to new chunk"
        );
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// End the run, persisting the counters for this theme.
    pub fn exit(self, store: &mut dyn ProgressStore) -> Result<Tally, SessionError> {
        store.save(self.theme, &self.state.tally)?;
        tracing::info!(
            theme = %self.theme,
            coins = self.state.tally.coins,
            gems = self.state.tally.gems,
            ticks = self.state.tick,
            "Run saved"
        );
        Ok(self.state.tally)
    }

    pub fn snapshot(&self) -> Vec<u8> {
        rmp_serde::to_vec(&self.state).expect("run state serialization must succeed")
    }

    pub fn restore(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.state = rmp_serde::from_slice(data)?;
        Ok(())
    }

    /// Visible tiles with the camera centered on the actor.
    pub fn draw_list(&self) -> impl Iterator<Item = DrawCmd> + '_ {
        let offset = render::camera_offset(&self.config.world, self.state.actor.x);
        render::visible_draw_list(&self.state.grid, &self.config.world, offset)
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn actor(&self) -> &Actor {
        &self.state.actor
    }

    pub fn tally(&self) -> Tally {
        self.state.tally
    }

    pub fn grid(&self) -> &TileGrid {
        &self.state.grid
    }

    pub fn theme(&self) -> Terrain {
        self.theme
    }

    pub fn stats(&self) -> &UpgradeStats {
        &self.stats
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    #[cfg(test)]
    fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }
}
