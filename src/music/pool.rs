//! Fixed-size voice pool for polyphonic playback.
//!
//! # Design Overview
//!
//! The `VoicePool` owns `POLYPHONY` voices at fixed indices for its whole
//! lifetime and maps pressed pitches onto them. There is no dynamic
//! allocation after construction.
//!
//! ## Allocation policy
//!
//! When `note_on()` arrives:
//!
//! 1. A voice already gated on the same pitch is re-used (legato: pitch and
//!    level follow, the envelope does not restart). This is what keeps a pitch
//!    from ever sounding on two voices at once.
//! 2. Otherwise the first ungated voice whose DSP has finished its release is
//!    claimed.
//! 3. Otherwise the first ungated voice still in its release tail is claimed,
//!    cutting the tail short.
//! 4. Otherwise the note is dropped and `note_on()` returns `false`. A gated
//!    voice is never stolen.
//!
//! ## Live keys and patterns
//!
//! Voices claimed with `key_down()` belong to a key that is physically held.
//! Pattern playback (`play_lead()`, `play_slot()`, `play_chord()`) only ever
//! releases pattern voices, so a held key keeps sounding under a running
//! arpeggio or sequence until `key_up()` or `release_all()`.
//!
//! ## Mixing
//!
//! `render_sample()` sums every voice and divides by `POLYPHONY`. The
//! attenuation is fixed, so a single note is as loud alone as in a full
//! chord.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use polyarp::music::{NoteEvent, VoicePool};
//! use polyarp::synthesis::SynthVoice;
//! use polyarp::VoiceParams;
//!
//! let mut pool = VoicePool::<_, 6>::new(|| SynthVoice::new(48_000));
//!
//! pool.note_on(NoteEvent::new(0, 60, 100));
//! pool.note_on(NoteEvent::new(0, 64, 100));
//!
//! let mut block = [0.0; 64];
//! pool.render_block(&mut block, &VoiceParams::default());
//!
//! pool.note_off(64);
//! ```

use super::core::{NoteEvent, Slot};
use super::voice::Voice;
use crate::config::{Patch, VoiceParams};

/// Bookkeeping for a single voice in the pool.
struct VoiceSlot<V> {
    voice: V,
    /// Pitch last assigned; meaningful while gated or releasing
    pitch: Option<u8>,
    gate: bool,
    /// Gated by a held key rather than by pattern playback
    live: bool,
}

impl<V: Voice> VoiceSlot<V> {
    fn release(&mut self) {
        self.gate = false;
        self.live = false;
        self.voice.note_off();
    }
}

/// A fixed pool of `POLYPHONY` voices.
///
/// # Type Parameters
///
/// * `V` - Voice type
/// * `POLYPHONY` - Number of voices (must be > 0)
pub struct VoicePool<V: Voice, const POLYPHONY: usize> {
    slots: [VoiceSlot<V>; POLYPHONY],
}

impl<V: Voice, const POLYPHONY: usize> VoicePool<V, POLYPHONY> {
    /// Number of voices in the pool.
    pub const POLYPHONY: usize = POLYPHONY;

    /// Creates a pool, building each voice with `factory`.
    pub fn new(mut factory: impl FnMut() -> V) -> Self {
        Self::from_voices(std::array::from_fn(|_| factory()))
    }

    /// Creates a pool from already-built voices.
    pub fn from_voices(voices: [V; POLYPHONY]) -> Self {
        const { assert!(POLYPHONY > 0, "a voice pool needs at least one voice") };
        Self {
            slots: voices.map(|voice| VoiceSlot {
                voice,
                pitch: None,
                gate: false,
                live: false,
            }),
        }
    }

    /// Sends a patch to every voice.
    pub fn configure(&mut self, patch: &Patch) {
        for slot in self.slots.iter_mut() {
            slot.voice.configure(patch);
        }
    }

    /// Starts a note. Returns whether a voice was claimed.
    ///
    /// See the module docs for the allocation order. When every voice is
    /// gated on another pitch the note is dropped.
    pub fn note_on(&mut self, note: NoteEvent) -> bool {
        self.claim(note).is_some()
    }

    /// Starts a note for a held key. Pattern playback leaves the voice
    /// alone until [`VoicePool::key_up`].
    pub fn key_down(&mut self, note: NoteEvent) -> bool {
        match self.claim(note) {
            Some(idx) => {
                self.slots[idx].live = true;
                true
            }
            None => false,
        }
    }

    /// Releases the voice a held key claimed. Pattern voices on the same
    /// pitch are left sounding.
    pub fn key_up(&mut self, pitch: u8) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|s| s.gate && s.live && s.pitch == Some(pitch))
        {
            Some(slot) => {
                slot.release();
                true
            }
            None => false,
        }
    }

    /// Releases the gated voice holding `pitch`. Returns whether one was
    /// found; releasing an already released pitch is a no-op.
    pub fn note_off(&mut self, pitch: u8) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|s| s.gate && s.pitch == Some(pitch))
        {
            Some(slot) => {
                slot.release();
                true
            }
            None => false,
        }
    }

    /// Releases every gated voice, held keys included. Returns how many
    /// were released.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for slot in self.slots.iter_mut().filter(|s| s.gate) {
            slot.release();
            released += 1;
        }
        released
    }

    /// Releases every gated voice not claimed by a held key. Returns how
    /// many were released.
    pub fn release_pattern(&mut self) -> usize {
        let mut released = 0;
        for slot in self.slots.iter_mut().filter(|s| s.gate && !s.live) {
            slot.release();
            released += 1;
        }
        released
    }

    /// Plays a single note on the lead voice, releasing the other pattern
    /// voices. Returns `false` if held keys occupy every voice.
    ///
    /// The lead is the first voice not claimed by a held key, index 0
    /// unless a key sits there. Its envelope restarts on every call, so
    /// repeated notes of the same pitch are articulated. Used for
    /// arpeggiator output.
    pub fn play_lead(&mut self, note: NoteEvent) -> bool {
        let Some(lead) = self.slots.iter().position(|s| !s.live) else {
            log::warn!("every voice is held, arp note {} dropped", note.pitch);
            return false;
        };

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if i != lead && slot.gate && !slot.live {
                slot.release();
            }
        }

        let slot = &mut self.slots[lead];
        slot.voice.note_on(note.pitch, note.velocity);
        slot.voice.retrigger();
        slot.pitch = Some(note.pitch);
        slot.gate = true;
        true
    }

    /// Plays a slot from a single-note stream: a note goes to the lead
    /// voice, a rest releases the pattern voices.
    pub fn play_slot(&mut self, slot: Slot) {
        match slot {
            Slot::Note(note) => {
                self.play_lead(note);
            }
            Slot::Rest => {
                self.release_pattern();
            }
        }
    }

    /// Releases the pattern voices, then sounds every note of `slots` at
    /// once, in list order. Rests are skipped. Returns how many notes were
    /// claimed.
    pub fn play_chord(&mut self, slots: &[Slot]) -> usize {
        self.release_pattern();
        let mut claimed = 0;
        for slot in slots {
            if let Slot::Note(note) = slot
                && self.note_on(*note)
            {
                claimed += 1;
            }
        }
        claimed
    }

    /// Returns true if `pitch` is gated on some voice.
    pub fn is_note_playing(&self, pitch: u8) -> bool {
        self.slots.iter().any(|s| s.gate && s.pitch == Some(pitch))
    }

    /// Number of gated voices.
    pub fn gated_count(&self) -> usize {
        self.slots.iter().filter(|s| s.gate).count()
    }

    /// Number of voices producing sound (gated or still releasing).
    pub fn active_voice_count(&self) -> usize {
        self.slots.iter().filter(|s| s.voice.is_active()).count()
    }

    /// Pitch gated on voice `index`, if any.
    pub fn gated_pitch(&self, index: usize) -> Option<u8> {
        self.slots
            .get(index)
            .filter(|s| s.gate)
            .and_then(|s| s.pitch)
    }

    /// Borrows the voice at `index`.
    pub fn voice(&self, index: usize) -> Option<&V> {
        self.slots.get(index).map(|s| &s.voice)
    }

    /// Generates the next mixed sample.
    pub fn render_sample(&mut self, params: &VoiceParams) -> f64 {
        let sum: f64 = self
            .slots
            .iter_mut()
            .map(|s| s.voice.render_sample(params))
            .sum();
        sum / POLYPHONY as f64
    }

    /// Fills `out` with mixed samples. Allocation-free.
    pub fn render_block(&mut self, out: &mut [f64], params: &VoiceParams) {
        for sample in out.iter_mut() {
            *sample = self.render_sample(params);
        }
    }

    fn claim(&mut self, note: NoteEvent) -> Option<usize> {
        let Some(idx) = self.find_voice_for(note.pitch) else {
            log::warn!("no free voice for pitch {}, note dropped", note.pitch);
            return None;
        };

        let slot = &mut self.slots[idx];
        if !slot.gate {
            slot.live = false;
        }
        slot.voice.note_on(note.pitch, note.velocity);
        slot.pitch = Some(note.pitch);
        slot.gate = true;
        Some(idx)
    }

    fn find_voice_for(&self, pitch: u8) -> Option<usize> {
        // Same pitch already gated: legato on that voice
        if let Some(idx) = self
            .slots
            .iter()
            .position(|s| s.gate && s.pitch == Some(pitch))
        {
            return Some(idx);
        }

        self.slots
            .iter()
            .position(|s| !s.gate && !s.voice.is_active())
            .or_else(|| self.slots.iter().position(|s| !s.gate))
    }
}
