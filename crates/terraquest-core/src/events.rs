use serde::{Deserialize, Serialize};

use crate::terrain::Terrain;

/// Events emitted by the simulation during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    CoinCollected {
        column: u32,
        row: u32,
    },
    GemCollected {
        column: u32,
        row: u32,
    },
    SpikeHit {
        column: u32,
        row: u32,
        coins_lost: u32,
        gems_lost: u32,
    },
    /// The actor crossed the regeneration threshold of the current chunk.
    ChunkExhausted,
    /// A fresh chunk replaced the exhausted one.
    ChunkAdvanced {
        chunk_index: u32,
    },
    /// The terrain's gem counter reached the goal for the first time this run.
    GoalReached {
        theme: Terrain,
    },
}

impl SimEvent {
    /// Sound the audio collaborator should play for this event, if any.
    pub fn audio_cue(&self) -> Option<AudioCue> {
        match self {
            SimEvent::CoinCollected { .. } => Some(AudioCue::CoinCollected),
            SimEvent::GemCollected { .. } => Some(AudioCue::GemCollected),
            _ => None,
        }
    }
}

/// Fire-and-forget sound triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCue {
    CoinCollected,
    GemCollected,
}

/// Audio collaborator. Implementations must not block the tick.
pub trait AudioSink: Send {
    fn play(&mut self, cue: AudioCue);
}

/// Sink that drops every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: AudioCue) {}
}
