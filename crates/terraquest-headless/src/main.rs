mod store;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use terraquest_core::events::SimEvent;
use terraquest_core::mode::{AppController, Nav, NavError};
use terraquest_core::progress::{ProgressError, campaign_won, terrains_completed};
use terraquest_core::terrain::{Terrain, UnknownTerrain};
use terraquest_runner::config::RunnerConfig;
use terraquest_runner::grid::Tile;
use terraquest_runner::physics::Intents;
use terraquest_runner::render::TileAtlas;
use terraquest_runner::{RunSession, SessionError};

use store::TextDirStore;

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("bad argument {arg:?}: {reason}")]
    Arg { arg: String, reason: String },
    #[error(transparent)]
    Terrain(#[from] UnknownTerrain),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Nav(#[from] NavError),
}

#[derive(Debug, Clone, PartialEq)]
struct Args {
    theme: Terrain,
    ticks: u64,
    data: PathBuf,
    seed: Option<u64>,
    reset: bool,
    /// Pace ticks at the configured tick rate instead of running flat out.
    realtime: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            theme: Terrain::Forest,
            ticks: 3600,
            data: std::env::var("TERRAQUEST_DATA")
                .unwrap_or_else(|_| "DATA/stats".to_string())
                .into(),
            seed: None,
            reset: false,
            realtime: false,
        }
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, RunError> {
    let mut out = Args::default();
    for arg in args {
        let bad = |reason: &str| RunError::Arg {
            arg: arg.clone(),
            reason: reason.to_string(),
        };
        if let Some(v) = arg.strip_prefix("--theme=") {
            out.theme = v.parse()?;
        } else if let Some(v) = arg.strip_prefix("--ticks=") {
            out.ticks = v.parse().map_err(|_| bad("expected a tick count"))?;
        } else if let Some(v) = arg.strip_prefix("--data=") {
            out.data = v.into();
        } else if let Some(v) = arg.strip_prefix("--seed=") {
            out.seed = Some(v.parse().map_err(|_| bad("expected an integer seed"))?);
        } else if arg == "--reset" {
            out.reset = true;
        } else if arg == "--realtime" {
            out.realtime = true;
        } else {
            return Err(bad("unknown flag"));
        }
    }
    Ok(out)
}

/// Printed to stdout as one JSON line when the run ends.
#[derive(Debug, Serialize)]
struct RunSummary {
    theme: Terrain,
    ticks: u64,
    /// Simulated time covered by the run.
    sim_seconds: f32,
    chunks: u32,
    coins: u32,
    gems: u32,
    spikes_hit: u32,
    terrains_completed: usize,
    campaign_won: bool,
}

/// Maps tiles to the asset files a renderer would load for them.
struct AssetPaths;

impl TileAtlas for AssetPaths {
    type Handle = PathBuf;

    fn handle(&self, theme: Terrain, tile: Tile) -> PathBuf {
        let name = match tile {
            Tile::Border(kind) => format!("tile_{:02}", kind.atlas_index()),
            Tile::Coin => "coin".to_string(),
            Tile::Gem => "gem".to_string(),
            Tile::Spike | Tile::SpentSpike => "spike".to_string(),
            Tile::Decor(n) => format!("decor_{n}"),
            Tile::Empty => "empty".to_string(),
        };
        PathBuf::from("assets").join(theme.to_string()).join(format!("{name}.png"))
    }
}

/// Holds right and jumps whenever forward progress stalls.
#[derive(Debug, Default)]
struct Autopilot {
    last_x: Option<i32>,
}

impl Autopilot {
    fn intents(&mut self, x: i32) -> Intents {
        let stalled = self.last_x == Some(x);
        self.last_x = Some(x);
        Intents {
            move_right: true,
            jump: stalled,
            ..Default::default()
        }
    }
}

fn run(args: Args) -> Result<RunSummary, RunError> {
    let mut config = RunnerConfig::load();
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let mut store = TextDirStore::open(&args.data)?;
    tracing::debug!(dir = %store.dir().display(), "Progress store open");
    let mut app = AppController::new();

    if args.reset {
        app.apply(Nav::RequestReset)?;
        let transition = app.apply(Nav::ConfirmReset)?;
        if transition.reset_progress {
            store.reset()?;
        }
    }

    app.apply(Nav::Play)?;
    app.apply(Nav::SelectCharacter(0))?;
    app.apply(Nav::SelectTerrain(args.theme))?;

    let (mut session, tiles) =
        RunSession::start_with_atlas(config, args.theme, &store, &AssetPaths)?;
    tracing::debug!(assets = tiles.len(), "Resolved tile assets");
    let tick_len = Duration::from_secs_f32(session.config().tick_dt());
    let mut pilot = Autopilot::default();
    let mut spikes_hit = 0;
    for _ in 0..args.ticks {
        if args.realtime {
            std::thread::sleep(tick_len);
        }
        let intents = pilot.intents(session.actor().x);
        for event in session.tick(&intents) {
            match event {
                SimEvent::SpikeHit { .. } => spikes_hit += 1,
                SimEvent::GoalReached { theme } => {
                    tracing::info!(%theme, "Terrain complete");
                },
                _ => {},
            }
        }
    }
    let chunks = session.state().chunk_index + 1;
    let ticks = session.state().tick;
    let sim_seconds = ticks as f32 * session.config().tick_dt();

    let transition = app.apply(Nav::Back)?;
    let tally = if transition.save_progress {
        session.exit(&mut store)?
    } else {
        session.tally()
    };

    let won = campaign_won(&store)?;
    if won {
        app.apply(Nav::ShowWin)?;
    }
    Ok(RunSummary {
        theme: args.theme,
        ticks,
        sim_seconds,
        chunks,
        coins: tally.coins,
        gems: tally.gems,
        spikes_hit,
        terrains_completed: terrains_completed(&store)?,
        campaign_won: won,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let result = parse_args(std::env::args().skip(1)).and_then(|args| {
        tracing::info!(
            theme = %args.theme,
            ticks = args.ticks,
            data = %args.data.display(),
            "Terra Quest headless run"
        );
        run(args)
    });
    match result {
        Ok(summary) => {
            match serde_json::to_string(&summary) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("Failed to encode summary: {e}"),
            }
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terraquest_core::progress::ProgressStore;

    fn args(list: &[&str]) -> Result<Args, RunError> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_flags() {
        let parsed = args(&["--theme=Desert", "--ticks=10", "--data=/tmp/x", "--seed=5"]).unwrap();
        assert!(!parsed.realtime);
        assert_eq!(parsed.theme, Terrain::Desert);
        assert_eq!(parsed.ticks, 10);
        assert_eq!(parsed.data, PathBuf::from("/tmp/x"));
        assert_eq!(parsed.seed, Some(5));
        assert!(!parsed.reset);
        assert!(args(&["--realtime"]).unwrap().realtime);
    }

    #[test]
    fn rejects_unknown_flags_and_values() {
        assert!(matches!(args(&["--fly"]), Err(RunError::Arg { .. })));
        assert!(matches!(args(&["--ticks=many"]), Err(RunError::Arg { .. })));
        assert!(matches!(args(&["--theme=ocean"]), Err(RunError::Terrain(_))));
    }

    #[test]
    fn autopilot_jumps_when_stalled() {
        let mut pilot = Autopilot::default();
        assert!(!pilot.intents(10).jump);
        assert!(!pilot.intents(13).jump);
        let stuck = pilot.intents(13);
        assert!(stuck.jump && stuck.move_right);
    }

    #[test]
    fn asset_paths_follow_theme_and_tile() {
        let path = AssetPaths.handle(Terrain::Desert, Tile::Gem);
        assert_eq!(path, PathBuf::from("assets/desert/gem.png"));
        assert_eq!(
            AssetPaths.handle(Terrain::Forest, Tile::SpentSpike),
            AssetPaths.handle(Terrain::Forest, Tile::Spike)
        );
    }

    #[test]
    fn headless_run_persists_progress() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("stats");
        let summary = run(Args {
            theme: Terrain::Tundra,
            ticks: 300,
            data: data.clone(),
            seed: Some(11),
            reset: false,
            realtime: false,
        })
        .unwrap();
        assert_eq!(summary.ticks, 300);
        assert!((summary.sim_seconds - 5.0).abs() < 1e-3);
        assert!(!summary.campaign_won);

        let store = TextDirStore::open(&data).unwrap();
        assert_eq!(store.gems_for(Terrain::Tundra).unwrap(), summary.gems);
        assert_eq!(store.load(Terrain::Tundra).unwrap().coins, summary.coins);
    }

    #[test]
    fn reset_flag_clears_previous_progress() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("player_coins.txt"), "500").unwrap();
        let summary = run(Args {
            theme: Terrain::Forest,
            ticks: 1,
            data: dir.path().to_path_buf(),
            seed: Some(3),
            reset: true,
            realtime: false,
        })
        .unwrap();
        assert!(summary.coins < 500);
    }
}
