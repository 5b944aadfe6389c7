//! Reference DSP voice.
//!
//! Everything here sits behind the [`Voice`](crate::music::Voice) trait; the
//! note-control core never depends on it. Enabled by the `synth` feature.

mod envelope;
mod filter;
mod oscillator;
mod voice;

pub use envelope::{Adsr, Envelope};
pub use filter::{LowPass, MAX_CUTOFF_HZ, MIN_CUTOFF_HZ, cutoff_hz};
pub use oscillator::Oscillator;
pub use voice::SynthVoice;
