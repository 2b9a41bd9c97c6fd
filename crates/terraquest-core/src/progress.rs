use serde::{Deserialize, Serialize};

use crate::terrain::Terrain;

/// Gems needed in one terrain to complete it.
pub const GEM_GOAL: u32 = 100;

/// Field order of the persisted stats record.
pub const STAT_FIELDS: [&str; 4] = ["speed", "jump_power", "gem_resist", "coin_resist"];

/// Errors raised while reading or writing persisted progress.
///
/// A session never starts from a record that produced one of these.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("{origin}: missing field `{field}`")]
    MissingField { origin: String, field: &'static str },
    #[error("{origin}: field `{field}` is not a number: {value:?}")]
    NotNumeric {
        origin: String,
        field: &'static str,
        value: String,
    },
    #[error("{origin}: field `{field}` = {value} is out of range ({reason})")]
    OutOfRange {
        origin: String,
        field: &'static str,
        value: i64,
        reason: &'static str,
    },
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Upgradeable player stats. Read-only for the length of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeStats {
    /// Horizontal pixels per tick.
    pub speed: u32,
    /// Upward velocity applied on jump.
    pub jump_power: u32,
    /// Gems lost per spike hit.
    pub gem_resist: u32,
    /// Coins lost per spike hit.
    pub coin_resist: u32,
}

impl Default for UpgradeStats {
    fn default() -> Self {
        Self {
            speed: 3,
            jump_power: 12,
            gem_resist: 3,
            coin_resist: 5,
        }
    }
}

impl UpgradeStats {
    pub fn from_fields(fields: [u32; 4]) -> Self {
        let [speed, jump_power, gem_resist, coin_resist] = fields;
        Self {
            speed,
            jump_power,
            gem_resist,
            coin_resist,
        }
    }

    pub fn to_fields(self) -> [u32; 4] {
        [self.speed, self.jump_power, self.gem_resist, self.coin_resist]
    }

    /// Reject stats the resolver cannot run with. Speed must be non-zero and
    /// at most `max_speed` (one tile) so a single step never skips a wall.
    pub fn validate(&self, origin: &str, max_speed: u32) -> Result<(), ProgressError> {
        if self.speed == 0 {
            return Err(ProgressError::OutOfRange {
                origin: origin.to_string(),
                field: "speed",
                value: 0,
                reason: "must be at least 1",
            });
        }
        if self.speed > max_speed {
            return Err(ProgressError::OutOfRange {
                origin: origin.to_string(),
                field: "speed",
                value: i64::from(self.speed),
                reason: "must not exceed one tile per tick",
            });
        }
        Ok(())
    }
}

/// Coin and gem counters mutated by the resolver during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub coins: u32,
    pub gems: u32,
}

impl Tally {
    pub fn collect_coin(&mut self) {
        self.coins = self.coins.saturating_add(1);
    }

    pub fn collect_gem(&mut self) {
        self.gems = self.gems.saturating_add(1);
    }

    /// Deduct a spike hit, flooring both counters at zero. Returns what was
    /// actually lost as `(coins, gems)`.
    pub fn apply_hazard(&mut self, stats: &UpgradeStats) -> (u32, u32) {
        let coins_lost = self.coins.min(stats.coin_resist);
        let gems_lost = self.gems.min(stats.gem_resist);
        self.coins -= coins_lost;
        self.gems -= gems_lost;
        (coins_lost, gems_lost)
    }
}

/// Everything the core reads from persistence at session start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub coins: u32,
    /// Gems for the terrain the record was loaded for.
    pub gems: u32,
    pub stats: UpgradeStats,
}

impl ProgressRecord {
    pub fn tally(&self) -> Tally {
        Tally {
            coins: self.coins,
            gems: self.gems,
        }
    }
}

/// Persistence collaborator. Coins are shared across terrains, gems are kept
/// per terrain.
pub trait ProgressStore {
    fn load(&self, theme: Terrain) -> Result<ProgressRecord, ProgressError>;

    fn save(&mut self, theme: Terrain, tally: &Tally) -> Result<(), ProgressError>;

    fn gems_for(&self, theme: Terrain) -> Result<u32, ProgressError>;
}

/// Number of terrains whose gem count has reached [`GEM_GOAL`].
pub fn terrains_completed(store: &dyn ProgressStore) -> Result<usize, ProgressError> {
    let mut done = 0;
    for theme in Terrain::ALL {
        if store.gems_for(theme)? >= GEM_GOAL {
            done += 1;
        }
    }
    Ok(done)
}

/// Whether every terrain is complete.
pub fn campaign_won(store: &dyn ProgressStore) -> Result<bool, ProgressError> {
    Ok(terrains_completed(store)? == Terrain::ALL.len())
}

/// Parse a whitespace-separated record of non-negative integers, one per
/// entry of `fields`. Trailing extra values are ignored with a warning.
pub fn parse_counts<const N: usize>(
    origin: &str,
    text: &str,
    fields: [&'static str; N],
) -> Result<[u32; N], ProgressError> {
    let mut tokens = text.split_whitespace();
    let mut out = [0u32; N];
    for (slot, field) in out.iter_mut().zip(fields) {
        let Some(token) = tokens.next() else {
            return Err(ProgressError::MissingField {
                origin: origin.to_string(),
                field,
            });
        };
        let value: i64 = token.parse().map_err(|_| ProgressError::NotNumeric {
            origin: origin.to_string(),
            field,
            value: token.to_string(),
        })?;
        *slot = u32::try_from(value).map_err(|_| ProgressError::OutOfRange {
            origin: origin.to_string(),
            field,
            value,
            reason: "must be between 0 and 4294967295",
        })?;
    }
    let extra = tokens.count();
    if extra > 0 {
        tracing::warn!(origin, extra, "Ignoring trailing values in progress record");
    }
    Ok(out)
}

/// Render counts the way [`parse_counts`] reads them.
pub fn format_counts(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
