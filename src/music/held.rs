//! The set of keys currently held down, in press order.

use super::core::NoteEvent;

/// Keys currently held, ordered by first press.
///
/// A pitch appears at most once. Re-pressing a held pitch keeps its original
/// position and refreshes its channel and velocity.
///
/// # Examples
///
/// ```
/// use polyarp::music::{HeldNotes, NoteEvent};
///
/// let mut held = HeldNotes::new();
/// held.press(NoteEvent::new(0, 64, 100));
/// held.press(NoteEvent::new(0, 60, 100));
/// held.press(NoteEvent::new(0, 64, 30)); // re-press: stays first
///
/// let pitches: Vec<u8> = held.iter().map(|n| n.pitch).collect();
/// assert_eq!(pitches, [64, 60]);
/// assert_eq!(held.as_slice()[0].velocity, 30);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldNotes {
    notes: Vec<NoteEvent>,
}

impl HeldNotes {
    /// Room for this many distinct pitches is reserved up front.
    pub const RESERVED: usize = 16;

    pub fn new() -> Self {
        Self {
            notes: Vec::with_capacity(Self::RESERVED),
        }
    }

    /// Records a key press. Returns `true` if the pitch was not already held.
    pub fn press(&mut self, note: NoteEvent) -> bool {
        match self.notes.iter_mut().find(|n| n.pitch == note.pitch) {
            Some(existing) => {
                *existing = note;
                false
            }
            None => {
                self.notes.push(note);
                true
            }
        }
    }

    /// Records a key release. Returns `true` if the pitch was held.
    pub fn release(&mut self, pitch: u8) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.pitch != pitch);
        self.notes.len() != before
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.notes.iter().any(|n| n.pitch == pitch)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteEvent> {
        self.notes.iter()
    }

    pub fn as_slice(&self) -> &[NoteEvent] {
        &self.notes
    }
}
