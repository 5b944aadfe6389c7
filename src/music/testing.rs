//! Recording stand-in for the DSP layer, used by the unit tests.

use super::voice::Voice;
use crate::config::{Patch, VoiceParams};

/// Voice that records what it was asked to do.
///
/// While gated it outputs 1.0. After `note_off` it stays active for
/// `release_len` rendered samples, outputting 0.5, then goes idle.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestVoice {
    pub pitch: Option<u8>,
    pub velocity: u8,
    pub gate: bool,
    pub release_len: usize,
    pub releasing: usize,
    pub note_ons: usize,
    pub restarts: usize,
    pub note_offs: usize,
    pub patch: Option<Patch>,
}

impl TestVoice {
    pub fn with_release(release_len: usize) -> Self {
        Self {
            release_len,
            ..Self::default()
        }
    }
}

impl Voice for TestVoice {
    fn configure(&mut self, patch: &Patch) {
        self.patch = Some(*patch);
    }

    fn note_on(&mut self, pitch: u8, velocity: u8) {
        if !self.gate {
            self.restarts += 1;
        }
        self.pitch = Some(pitch);
        self.velocity = velocity;
        self.gate = true;
        self.releasing = 0;
        self.note_ons += 1;
    }

    fn retrigger(&mut self) {
        self.restarts += 1;
    }

    fn note_off(&mut self) {
        if self.gate {
            self.releasing = self.release_len;
        }
        self.gate = false;
        self.note_offs += 1;
    }

    fn is_active(&self) -> bool {
        self.gate || self.releasing > 0
    }

    fn render_sample(&mut self, _params: &VoiceParams) -> f64 {
        if self.gate {
            1.0
        } else if self.releasing > 0 {
            self.releasing -= 1;
            0.5
        } else {
            0.0
        }
    }
}
