//! The reference sound-generating voice.

use super::envelope::{Adsr, Envelope};
use super::filter::{LowPass, cutoff_hz};
use super::oscillator::Oscillator;
use crate::config::{Patch, VoiceParams};
use crate::music::Voice;
use crate::music::core::midi_to_freq;

/// Two detuned oscillators into a resonant low-pass filter, shaped by an
/// amplitude envelope and a filter envelope.
///
/// The filter cutoff for each sample is the shared cutoff knob plus the
/// filter envelope scaled by the envelope depth, mapped through
/// [`cutoff_hz`]. Output level is velocity / 127.
///
/// # Examples
///
/// ```
/// use polyarp::music::Voice;
/// use polyarp::synthesis::SynthVoice;
/// use polyarp::{Patch, VoiceParams};
///
/// let mut voice = SynthVoice::new(48_000);
/// voice.configure(&Patch::default());
///
/// voice.note_on(69, 127);
/// let params = VoiceParams::default();
/// let peak = (0..4_800)
///     .map(|_| voice.render_sample(&params).abs())
///     .fold(0.0, f64::max);
/// assert!(peak > 0.0);
///
/// voice.note_off();
/// while voice.is_active() {
///     voice.render_sample(&params);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SynthVoice {
    sample_rate: u32,
    oscillators: [Oscillator; 2],
    filter: LowPass,
    amp_env: Adsr,
    filter_env: Adsr,
    /// Frequency ratio of the second oscillator
    detune: f64,
    amplitude: f64,
    gate: bool,
}

impl SynthVoice {
    pub fn new(sample_rate: u32) -> Self {
        let patch = Patch::default();
        Self {
            sample_rate,
            oscillators: [
                Oscillator::new(patch.wave_shape, sample_rate),
                Oscillator::new(patch.wave_shape, sample_rate),
            ],
            filter: LowPass::new(sample_rate),
            amp_env: Adsr::new(patch.amp_env, sample_rate),
            filter_env: Adsr::new(patch.filter_env, sample_rate),
            detune: patch.detune,
            amplitude: 0.0,
            gate: false,
        }
    }

    pub fn is_gated(&self) -> bool {
        self.gate
    }
}

impl Voice for SynthVoice {
    fn configure(&mut self, patch: &Patch) {
        for osc in self.oscillators.iter_mut() {
            osc.set_shape(patch.wave_shape);
        }
        self.detune = patch.detune;
        self.amp_env.set(&patch.amp_env);
        self.filter_env.set(&patch.filter_env);
    }

    fn note_on(&mut self, pitch: u8, velocity: u8) {
        let frequency = midi_to_freq(pitch);
        self.oscillators[0].set_frequency(frequency);
        self.oscillators[1].set_frequency(frequency * self.detune);
        self.amplitude = f64::from(velocity.min(127)) / 127.0;

        if !self.gate {
            if !self.amp_env.is_active() {
                self.filter.reset();
            }
            self.retrigger();
        }
        self.gate = true;
    }

    fn retrigger(&mut self) {
        self.amp_env.trigger();
        self.filter_env.trigger();
    }

    fn note_off(&mut self) {
        self.gate = false;
        self.amp_env.release();
        self.filter_env.release();
    }

    fn is_active(&self) -> bool {
        self.amp_env.is_active()
    }

    fn render_sample(&mut self, params: &VoiceParams) -> f64 {
        if !self.amp_env.is_active() {
            return 0.0;
        }

        let [a, b] = &mut self.oscillators;
        let mix = 0.5 * (a.next_sample() + b.next_sample());

        let cutoff = params.cutoff + self.filter_env.next_sample() * params.env_depth;
        self.filter
            .set(cutoff_hz(cutoff, self.sample_rate), params.resonance);
        let filtered = self.filter.process(mix);

        filtered * self.amp_env.next_sample() * self.amplitude
    }
}
