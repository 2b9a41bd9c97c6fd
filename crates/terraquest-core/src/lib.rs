pub mod events;
pub mod mode;
pub mod progress;
pub mod terrain;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::events::{AudioCue, AudioSink};
    use crate::progress::{ProgressError, ProgressRecord, ProgressStore, Tally, UpgradeStats};
    use crate::terrain::Terrain;

    /// In-memory progress store. Records every save for assertions.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryStore {
        pub coins: u32,
        pub gems: HashMap<Terrain, u32>,
        pub stats: UpgradeStats,
        pub saves: Vec<(Terrain, Tally)>,
    }

    impl MemoryStore {
        pub fn with_stats(stats: UpgradeStats) -> Self {
            Self {
                stats,
                ..Default::default()
            }
        }
    }

    impl ProgressStore for MemoryStore {
        fn load(&self, theme: Terrain) -> Result<ProgressRecord, ProgressError> {
            Ok(ProgressRecord {
                coins: self.coins,
                gems: self.gems_for(theme)?,
                stats: self.stats,
            })
        }

        fn save(&mut self, theme: Terrain, tally: &Tally) -> Result<(), ProgressError> {
            self.coins = tally.coins;
            self.gems.insert(theme, tally.gems);
            self.saves.push((theme, *tally));
            Ok(())
        }

        fn gems_for(&self, theme: Terrain) -> Result<u32, ProgressError> {
            Ok(self.gems.get(&theme).copied().unwrap_or(0))
        }
    }

    /// Audio sink that records cues into a shared buffer.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingAudio {
        cues: Arc<Mutex<Vec<AudioCue>>>,
    }

    impl RecordingAudio {
        /// Handle for reading the cues after the sink has been moved into a session.
        pub fn cues(&self) -> Arc<Mutex<Vec<AudioCue>>> {
            Arc::clone(&self.cues)
        }
    }

    impl AudioSink for RecordingAudio {
        fn play(&mut self, cue: AudioCue) {
            if let Ok(mut cues) = self.cues.lock() {
                cues.push(cue);
            }
        }
    }
}
