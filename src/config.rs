//! Configuration: the engine setup, the per-voice patch and the shared
//! render-time parameter snapshot.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::music::sequencer::MAX_STEPS;

/// Oscillator wave shapes understood by the voice layer.
///
/// The order matches the controller scaling: a 0-127 knob is split into
/// eight equal zones, zone 0 being `Sine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WaveShape {
    Sine,
    Triangle,
    Saw,
    Ramp,
    Square,
    PolyBlepTriangle,
    #[default]
    PolyBlepSaw,
    PolyBlepSquare,
}

impl WaveShape {
    pub const COUNT: usize = 8;

    /// Returns the shape for a zone index, clamping to the last shape.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => WaveShape::Sine,
            1 => WaveShape::Triangle,
            2 => WaveShape::Saw,
            3 => WaveShape::Ramp,
            4 => WaveShape::Square,
            5 => WaveShape::PolyBlepTriangle,
            6 => WaveShape::PolyBlepSaw,
            _ => WaveShape::PolyBlepSquare,
        }
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            WaveShape::Sine => "sine",
            WaveShape::Triangle => "tri",
            WaveShape::Saw => "saw",
            WaveShape::Ramp => "ramp",
            WaveShape::Square => "square",
            WaveShape::PolyBlepTriangle => "blep tri",
            WaveShape::PolyBlepSaw => "blep saw",
            WaveShape::PolyBlepSquare => "blep square",
        }
    }
}

/// ADSR settings. Times are in seconds, `sustain` is a level in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvelopeSettings {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl EnvelopeSettings {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
        }
    }
}

/// Per-voice configuration, delivered to every voice through
/// [`Voice::configure`](crate::music::Voice::configure).
///
/// Changes to `detune` take effect on the next note-on.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Patch {
    pub wave_shape: WaveShape,
    /// Frequency ratio of the second oscillator (1.0 = unison, 2.0 = octave)
    pub detune: f64,
    pub amp_env: EnvelopeSettings,
    pub filter_env: EnvelopeSettings,
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            wave_shape: WaveShape::default(),
            detune: 1.005,
            amp_env: EnvelopeSettings::new(0.007, 0.2, 0.6, 0.15),
            filter_env: EnvelopeSettings::new(0.007, 0.3, 0.0, 0.15),
        }
    }
}

/// Parameters shared by all voices, passed by reference into every render
/// call.
///
/// This is an immutable snapshot from the render context's point of view: the
/// control context replaces fields between blocks and every voice in a block
/// sees the same values. All fields are normalized to 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoiceParams {
    /// Filter cutoff knob position (mapped logarithmically by the voice)
    pub cutoff: f64,
    pub resonance: f64,
    /// How far the filter envelope opens the cutoff
    pub env_depth: f64,
}

impl VoiceParams {
    pub fn new(cutoff: f64, resonance: f64, env_depth: f64) -> Self {
        Self {
            cutoff: cutoff.clamp(0.0, 1.0),
            resonance: resonance.clamp(0.0, 1.0),
            env_depth: env_depth.clamp(0.0, 1.0),
        }
    }
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self::new(0.6, 0.2, 0.3)
    }
}

/// Engine setup.
///
/// # Examples
///
/// ```
/// use polyarp::SynthConfig;
///
/// let config = SynthConfig::default()
///     .with_sample_rate(44_100)
///     .with_arp_note_length(0.1)
///     .with_initial_steps(4);
/// assert!(config.validate().is_ok());
///
/// let broken = SynthConfig::default().with_seq_step_length(0.0);
/// assert!(broken.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynthConfig {
    pub sample_rate: u32,
    /// Seconds between arpeggiator notes
    pub arp_note_length: f64,
    /// Seconds between sequencer steps
    pub seq_step_length: f64,
    pub initial_steps: usize,
    /// Seed for the arpeggiator's random mode
    pub arp_seed: u64,
    pub patch: Patch,
    pub params: VoiceParams,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            arp_note_length: 0.051_25,
            seq_step_length: 0.25,
            initial_steps: 8,
            arp_seed: 0x5EED,
            patch: Patch::default(),
            params: VoiceParams::default(),
        }
    }
}

impl SynthConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_arp_note_length(mut self, seconds: f64) -> Self {
        self.arp_note_length = seconds;
        self
    }

    pub fn with_seq_step_length(mut self, seconds: f64) -> Self {
        self.seq_step_length = seconds;
        self
    }

    pub fn with_initial_steps(mut self, steps: usize) -> Self {
        self.initial_steps = steps;
        self
    }

    pub fn with_arp_seed(mut self, seed: u64) -> Self {
        self.arp_seed = seed;
        self
    }

    pub fn with_patch(mut self, patch: Patch) -> Self {
        self.patch = patch;
        self
    }

    pub fn with_params(mut self, params: VoiceParams) -> Self {
        self.params = params;
        self
    }

    /// Checks that the configuration describes a runnable engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        for (name, seconds) in [
            ("arp_note_length", self.arp_note_length),
            ("seq_step_length", self.seq_step_length),
        ] {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(ConfigError::InvalidLength { name, seconds });
            }
        }
        if self.initial_steps > MAX_STEPS {
            return Err(ConfigError::TooManySteps {
                requested: self.initial_steps,
                max: MAX_STEPS,
            });
        }
        Ok(())
    }
}
