//! The note-control core: voice pool, arpeggiator and step sequencer, plus
//! the note vocabulary and clock they share.

mod arp;
mod clock;
pub mod core;
mod held;
mod pool;
pub mod sequencer;
#[cfg(test)]
pub(crate) mod testing;
mod voice;

pub use self::core::{NoteEvent, NoteName, PitchClass, Slot, midi_to_freq, parse_note};
pub use arp::{ArpEngine, ArpMode};
pub use clock::{Clock, MIN_PERIOD};
pub use held::HeldNotes;
pub use pool::VoicePool;
pub use sequencer::{MAX_STEP_NOTES, MAX_STEPS, Step, StepAdvance, StepMode, StepSequencer};
pub use voice::Voice;
