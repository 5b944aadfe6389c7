//! Polyarp - the note-control core of a small polyphonic synthesizer.
//!
//! The crate decides, for every audio block and every incoming performance
//! event, which pitch each of a fixed number of voices should sound:
//!
//! - [`music::VoicePool`] maps pressed keys onto a bounded set of voices
//! - [`music::ArpEngine`] turns held keys into a clocked single-note pattern
//! - [`music::StepSequencer`] steps through stored chords and arp note sets
//! - [`router::EventRouter`] dispatches decoded MIDI input between them
//!
//! [`Synth`] assembles all of it. Sound generation sits behind the
//! [`music::Voice`] trait; the `synth` feature provides a reference voice in
//! [`synthesis`].

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod music;
pub mod router;
#[cfg(feature = "synth")]
pub mod synthesis;

// Re-export commonly used types at the crate root
pub use config::{EnvelopeSettings, Patch, SynthConfig, VoiceParams, WaveShape};
pub use engine::Synth;
pub use error::{ConfigError, Error, ParseError};
pub use music::{NoteEvent, Slot};
pub use router::{InputEvent, PlayMode};

#[cfg(feature = "macros")]
pub use polyarp_macros::note;
