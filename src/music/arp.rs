//! Arpeggiator: turns a set of held notes into a single-note stream.

use std::cmp::Reverse;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::clock::Clock;
use super::core::Slot;

/// Note-selection pattern.
///
/// Modes form a ring: `AsPlayed → Ascending → Descending → PingPong →
/// Random → AsPlayed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArpMode {
    /// Press order
    #[default]
    AsPlayed,
    /// Lowest pitch first
    Ascending,
    /// Highest pitch first
    Descending,
    /// Up then down in press order, without repeating the end notes
    PingPong,
    /// Uniform draw from a seeded generator
    Random,
}

impl ArpMode {
    /// Returns the next mode in the ring.
    pub fn next(self) -> Self {
        match self {
            ArpMode::AsPlayed => ArpMode::Ascending,
            ArpMode::Ascending => ArpMode::Descending,
            ArpMode::Descending => ArpMode::PingPong,
            ArpMode::PingPong => ArpMode::Random,
            ArpMode::Random => ArpMode::AsPlayed,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArpMode::AsPlayed => "played",
            ArpMode::Ascending => "up",
            ArpMode::Descending => "down",
            ArpMode::PingPong => "pingpong",
            ArpMode::Random => "random",
        }
    }
}

/// Clocked arpeggiator.
///
/// The engine keeps the notes it was given in their original order and a
/// working list derived from them for the current mode. Every clock tick
/// moves a cursor through the working list and yields the slot under it.
///
/// The cursor starts "before" the list, so the first tick after
/// construction (or after the cursor is invalidated by a shrinking list)
/// yields the first entry.
///
/// # Examples
///
/// ```
/// use polyarp::music::{ArpEngine, ArpMode, NoteEvent, Slot};
///
/// let mut arp = ArpEngine::new(0.1, 1000, 7);
/// arp.set_mode(ArpMode::Descending);
/// arp.set_notes([60, 67, 64].map(|p| NoteEvent::new(0, p, 100)));
///
/// let pitches: Vec<Option<u8>> = (0..3).map(|_| arp.next_slot().pitch()).collect();
/// assert_eq!(pitches, [Some(67), Some(64), Some(60)]);
///
/// arp.set_notes(Vec::<Slot>::new());
/// assert_eq!(arp.next_slot(), Slot::Rest);
/// ```
#[derive(Debug, Clone)]
pub struct ArpEngine {
    mode: ArpMode,
    /// Notes in the order they were supplied
    source: Vec<Slot>,
    /// `source` arranged for the current mode
    notes: Vec<Slot>,
    cursor: Option<usize>,
    /// PingPong direction
    ascending: bool,
    seed: u64,
    rng: StdRng,
    clock: Clock,
}

impl ArpEngine {
    /// Creates an arpeggiator stepping every `note_length` seconds.
    ///
    /// `seed` fixes the sequence drawn in [`ArpMode::Random`].
    pub fn new(note_length: f64, sample_rate: u32, seed: u64) -> Self {
        Self {
            mode: ArpMode::default(),
            source: Vec::with_capacity(16),
            notes: Vec::with_capacity(16),
            cursor: None,
            ascending: true,
            seed,
            rng: StdRng::seed_from_u64(seed),
            clock: Clock::new(note_length, sample_rate),
        }
    }

    /// Replaces the note list.
    ///
    /// The cursor is kept where it is unless it no longer points into the
    /// list, so changing the held notes does not make the pattern jump.
    pub fn set_notes<I, S>(&mut self, notes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Slot>,
    {
        self.source.clear();
        self.source.extend(notes.into_iter().map(Into::into));
        self.rebuild();
    }

    /// Drops every note. Subsequent ticks yield rests.
    pub fn clear(&mut self) {
        self.source.clear();
        self.rebuild();
    }

    pub fn mode(&self) -> ArpMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ArpMode) {
        if mode != self.mode {
            log::debug!("arp mode {} -> {}", self.mode.name(), mode.name());
            self.mode = mode;
            self.rebuild();
        }
    }

    /// Switches to the next mode in the ring and returns it.
    pub fn next_mode(&mut self) -> ArpMode {
        self.set_mode(self.mode.next());
        self.mode
    }

    /// Sets the time between notes. Returns `false` and keeps the old
    /// length if `seconds` is not a positive finite number.
    pub fn set_note_length(&mut self, seconds: f64) -> bool {
        self.clock.set_period(seconds)
    }

    pub fn note_length(&self) -> f64 {
        self.clock.period()
    }

    /// The working list for the current mode.
    pub fn notes(&self) -> &[Slot] {
        &self.notes
    }

    /// Index of the slot last yielded, if any.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Restarts the random sequence from the construction seed.
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// Advances the clock by `samples`. Called from the render context.
    pub fn advance_clock(&mut self, samples: usize) {
        self.clock.advance(samples);
    }

    /// Restarts the current note period and drops a pending tick.
    pub fn reset_clock(&mut self) {
        self.clock.reset_phase();
    }

    /// Consumes a pending clock tick and, if there was one, returns the next
    /// slot to play.
    ///
    /// A [`Slot::Rest`] means nothing is held: the consumer should release
    /// its voices rather than sound anything.
    pub fn tick(&mut self) -> Option<Slot> {
        if self.clock.take_due() {
            Some(self.next_slot())
        } else {
            None
        }
    }

    /// Moves the cursor one position for the current mode and returns the
    /// slot under it, regardless of the clock.
    pub fn next_slot(&mut self) -> Slot {
        let size = self.notes.len();
        if size == 0 {
            return Slot::Rest;
        }

        let next = if size == 1 {
            0
        } else {
            match self.mode {
                ArpMode::AsPlayed | ArpMode::Ascending | ArpMode::Descending => {
                    self.cursor.map_or(0, |c| (c + 1) % size)
                }
                ArpMode::PingPong => self.ping_pong(size),
                ArpMode::Random => self.rng.gen_range(0..size),
            }
        };

        self.cursor = Some(next);
        let slot = self.notes[next];
        log::trace!("arp {} -> {}", next, slot);
        slot
    }

    fn ping_pong(&mut self, size: usize) -> usize {
        let Some(c) = self.cursor else {
            self.ascending = true;
            return 0;
        };

        let last = size - 1;
        if self.ascending && c >= last {
            self.ascending = false;
        } else if !self.ascending && c == 0 {
            self.ascending = true;
        }

        if self.ascending { c + 1 } else { c - 1 }
    }

    fn rebuild(&mut self) {
        self.notes.clear();
        self.notes.extend_from_slice(&self.source);
        match self.mode {
            ArpMode::Ascending => self.notes.sort_by_key(Slot::sort_key),
            ArpMode::Descending => self.notes.sort_by_key(|s| Reverse(s.sort_key())),
            ArpMode::AsPlayed | ArpMode::PingPong | ArpMode::Random => {}
        }

        if self.cursor.is_some_and(|c| c >= self.notes.len()) {
            self.cursor = None;
        }
    }
}
