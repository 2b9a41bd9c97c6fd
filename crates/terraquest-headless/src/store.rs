use std::fs;
use std::path::{Path, PathBuf};

use terraquest_core::progress::{
    ProgressError, ProgressRecord, ProgressStore, STAT_FIELDS, Tally, UpgradeStats, format_counts,
    parse_counts,
};
use terraquest_core::terrain::Terrain;

const COINS_FILE: &str = "player_coins";
const STATS_FILE: &str = "player_stats";

/// Progress kept as one small text file per record in a data directory:
/// `player_coins.txt`, `player_gems_<terrain>.txt` and `player_stats.txt`,
/// each a space-separated list of integers.
#[derive(Debug, Clone)]
pub struct TextDirStore {
    dir: PathBuf,
}

impl TextDirStore {
    /// Open `dir`, creating it and any missing record with default values.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ProgressError> {
        let store = Self { dir: dir.into() };
        fs::create_dir_all(&store.dir).map_err(|source| ProgressError::Io {
            path: store.dir.display().to_string(),
            source,
        })?;
        if !store.path(COINS_FILE).exists() {
            store.write(COINS_FILE, &[0])?;
        }
        for theme in Terrain::ALL {
            let name = gems_file(theme);
            if !store.path(&name).exists() {
                store.write(&name, &[0])?;
            }
        }
        if !store.path(STATS_FILE).exists() {
            store.write(STATS_FILE, &UpgradeStats::default().to_fields())?;
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Overwrite every record with its starting value.
    pub fn reset(&mut self) -> Result<(), ProgressError> {
        self.write(COINS_FILE, &[0])?;
        for theme in Terrain::ALL {
            self.write(&gems_file(theme), &[0])?;
        }
        self.write(STATS_FILE, &UpgradeStats::default().to_fields())?;
        tracing::info!(dir = %self.dir.display(), "Progress reset");
        Ok(())
    }

    #[cfg(test)]
    fn save_stats(&mut self, stats: &UpgradeStats) -> Result<(), ProgressError> {
        self.write(STATS_FILE, &stats.to_fields())
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.txt"))
    }

    fn read<const N: usize>(
        &self,
        name: &str,
        fields: [&'static str; N],
    ) -> Result<[u32; N], ProgressError> {
        let path = self.path(name);
        let text = fs::read_to_string(&path).map_err(|source| ProgressError::Io {
            path: path.display().to_string(),
            source,
        })?;
        parse_counts(name, &text, fields)
    }

    fn write(&self, name: &str, values: &[u32]) -> Result<(), ProgressError> {
        let path = self.path(name);
        fs::write(&path, format_counts(values)).map_err(|source| ProgressError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

fn gems_file(theme: Terrain) -> String {
    format!("player_gems_{theme}")
}

impl ProgressStore for TextDirStore {
    fn load(&self, theme: Terrain) -> Result<ProgressRecord, ProgressError> {
        let [coins] = self.read(COINS_FILE, ["coins"])?;
        let gems = self.gems_for(theme)?;
        let stats = UpgradeStats::from_fields(self.read(STATS_FILE, STAT_FIELDS)?);
        Ok(ProgressRecord { coins, gems, stats })
    }

    fn save(&mut self, theme: Terrain, tally: &Tally) -> Result<(), ProgressError> {
        self.write(COINS_FILE, &[tally.coins])?;
        self.write(&gems_file(theme), &[tally.gems])?;
        tracing::debug!(%theme, coins = tally.coins, gems = tally.gems, "Progress saved");
        Ok(())
    }

    fn gems_for(&self, theme: Terrain) -> Result<u32, ProgressError> {
        let [gems] = self.read(&gems_file(theme), ["gems"])?;
        Ok(gems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terraquest_core::progress::{GEM_GOAL, campaign_won, terrains_completed};

    #[test]
    fn open_seeds_missing_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = TextDirStore::open(dir.path().join("stats")).unwrap();
        let record = store.load(Terrain::Forest).unwrap();
        assert_eq!(record.coins, 0);
        assert_eq!(record.gems, 0);
        assert_eq!(record.stats, UpgradeStats::default());
        assert!(store.dir().join("player_gems_desert.txt").exists());
    }

    #[test]
    fn reads_legacy_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("player_coins.txt"), "250 ").unwrap();
        fs::write(dir.path().join("player_gems_tundra.txt"), "42 ").unwrap();
        fs::write(dir.path().join("player_stats.txt"), "5 14 1 2 ").unwrap();
        let store = TextDirStore::open(dir.path()).unwrap();
        let record = store.load(Terrain::Tundra).unwrap();
        assert_eq!(record.coins, 250);
        assert_eq!(record.gems, 42);
        assert_eq!(record.stats, UpgradeStats::from_fields([5, 14, 1, 2]));
        // Files that already existed are left alone.
        assert_eq!(store.gems_for(Terrain::Forest).unwrap(), 0);
    }

    #[test]
    fn save_shares_coins_and_splits_gems() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TextDirStore::open(dir.path()).unwrap();
        store.save(Terrain::Desert, &Tally { coins: 30, gems: 7 }).unwrap();
        store.save(Terrain::Forest, &Tally { coins: 31, gems: 2 }).unwrap();
        assert_eq!(store.load(Terrain::Desert).unwrap().coins, 31);
        assert_eq!(store.gems_for(Terrain::Desert).unwrap(), 7);
        assert_eq!(store.gems_for(Terrain::Forest).unwrap(), 2);
        let text = fs::read_to_string(dir.path().join("player_gems_desert.txt")).unwrap();
        assert_eq!(text, "7");
    }

    #[test]
    fn malformed_stats_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        let store = TextDirStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("player_stats.txt"), "3 twelve 1 1").unwrap();
        let err = store.load(Terrain::Forest).unwrap_err();
        assert!(matches!(
            err,
            ProgressError::NotNumeric {
                field: "jump_power",
                ..
            }
        ));
        assert!(err.to_string().contains("player_stats"));

        fs::write(dir.path().join("player_stats.txt"), "3 12").unwrap();
        assert!(matches!(
            store.load(Terrain::Forest),
            Err(ProgressError::MissingField {
                field: "gem_resist",
                ..
            })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TextDirStore::open(dir.path()).unwrap();
        fs::remove_file(dir.path().join("player_coins.txt")).unwrap();
        let err = store.load(Terrain::Forest).unwrap_err();
        match err {
            ProgressError::Io { path, .. } => assert!(path.ends_with("player_coins.txt")),
            other => panic!("Expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn reset_restores_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TextDirStore::open(dir.path()).unwrap();
        for theme in Terrain::ALL {
            store.save(theme, &Tally { coins: 900, gems: GEM_GOAL }).unwrap();
        }
        store.save_stats(&UpgradeStats::from_fields([9, 20, 0, 0])).unwrap();
        assert!(campaign_won(&store).unwrap());

        store.reset().unwrap();
        assert_eq!(terrains_completed(&store).unwrap(), 0);
        let record = store.load(Terrain::Tundra).unwrap();
        assert_eq!(record.coins, 0);
        assert_eq!(record.stats, UpgradeStats::default());
    }
}
