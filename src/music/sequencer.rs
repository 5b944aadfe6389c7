//! Step sequencer.
//!
//! The `StepSequencer` holds an ordered list of steps, each a small note list
//! played either as a chord or through the arpeggiator. A [`Clock`] decides
//! when to move on; inactive steps are skipped.

use super::arp::ArpEngine;
use super::clock::Clock;
use super::core::Slot;
use super::pool::VoicePool;
use super::voice::Voice;

/// Maximum number of steps in a sequence.
pub const MAX_STEPS: usize = 32;

/// Maximum number of slots in a single step.
pub const MAX_STEP_NOTES: usize = 16;

/// How a step's notes are played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepMode {
    /// All notes sound at once
    #[default]
    Chord,
    /// Notes are handed to the arpeggiator
    Arp,
}

impl StepMode {
    pub fn toggled(self) -> Self {
        match self {
            StepMode::Chord => StepMode::Arp,
            StepMode::Arp => StepMode::Chord,
        }
    }
}

/// One slot in the sequence timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    pub notes: Vec<Slot>,
    pub mode: StepMode,
    /// Inactive steps are skipped during playback
    pub active: bool,
}

impl Step {
    pub fn new() -> Self {
        Self {
            notes: Vec::with_capacity(MAX_STEP_NOTES),
            mode: StepMode::default(),
            active: false,
        }
    }
}

/// Reported by [`StepSequencer::tick`] when playback lands on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepAdvance {
    pub index: usize,
    pub mode: StepMode,
}

/// Clocked list of steps.
///
/// `current` always indexes a step while the list is non-empty. Operations
/// on an empty list are no-ops.
///
/// # Examples
///
/// ```
/// use polyarp::music::{NoteEvent, StepSequencer};
///
/// // Two steps, 10 samples each at 1 kHz
/// let mut seq = StepSequencer::new(0.01, 1000, 2);
/// seq.step_forward(1);
/// seq.push_note(NoteEvent::new(0, 60, 100));
/// assert_eq!(seq.current_index(), 1);
///
/// seq.advance_clock(10);
/// // Step 0 is empty and inactive, so the lap comes back to step 1
/// assert_eq!(seq.tick().map(|a| a.index), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct StepSequencer {
    steps: Vec<Step>,
    current: usize,
    paused: bool,
    clock: Clock,
}

impl StepSequencer {
    /// Creates a sequencer with `initial_steps` empty, inactive steps
    /// (capped at [`MAX_STEPS`]) that advances every `step_length` seconds.
    pub fn new(step_length: f64, sample_rate: u32, initial_steps: usize) -> Self {
        let mut steps = Vec::with_capacity(MAX_STEPS);
        steps.resize_with(initial_steps.min(MAX_STEPS), Step::new);
        Self {
            steps,
            current: 0,
            paused: false,
            clock: Clock::new(step_length, sample_rate),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Index of the step being played or edited.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.current)
    }

    /// Appends an empty, inactive step. Returns `false` when full.
    pub fn add_step(&mut self) -> bool {
        if self.steps.len() >= MAX_STEPS {
            return false;
        }
        self.steps.push(Step::new());
        log::debug!("added step, {} total", self.steps.len());
        true
    }

    /// Removes the last step. Returns `false` when there is none.
    ///
    /// If the current step was the removed one, the cursor moves back by one.
    pub fn delete_step(&mut self) -> bool {
        if self.steps.pop().is_none() {
            return false;
        }
        if self.current >= self.steps.len() {
            self.current = self.steps.len().saturating_sub(1);
        }
        log::debug!("deleted step, {} left", self.steps.len());
        true
    }

    /// Moves the cursor by `delta` steps, wrapping in both directions.
    pub fn step_forward(&mut self, delta: i32) {
        if self.steps.is_empty() {
            return;
        }
        let len = self.steps.len() as i64;
        self.current = (self.current as i64 + i64::from(delta)).rem_euclid(len) as usize;
    }

    /// Appends a slot to the current step and activates it. Returns `false`
    /// if there is no step or the step is full.
    pub fn push_note(&mut self, slot: impl Into<Slot>) -> bool {
        let Some(step) = self.steps.get_mut(self.current) else {
            return false;
        };
        if step.notes.len() >= MAX_STEP_NOTES {
            return false;
        }
        step.notes.push(slot.into());
        step.active = true;
        true
    }

    /// Appends a rest to the current step.
    pub fn push_rest(&mut self) -> bool {
        self.push_note(Slot::Rest)
    }

    /// Removes the last slot of the current step. Removing the last one
    /// deactivates the step.
    pub fn pop_note(&mut self) -> Option<Slot> {
        let step = self.steps.get_mut(self.current)?;
        let popped = step.notes.pop();
        if step.notes.is_empty() {
            step.active = false;
        }
        popped
    }

    /// Flips the current step between chord and arp playback.
    pub fn toggle_step_mode(&mut self) -> Option<StepMode> {
        let step = self.steps.get_mut(self.current)?;
        step.mode = step.mode.toggled();
        Some(step.mode)
    }

    /// Flips the current step's active flag.
    pub fn toggle_step_active(&mut self) -> Option<bool> {
        let step = self.steps.get_mut(self.current)?;
        step.active = !step.active;
        Some(step.active)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes playback one full step length from now.
    pub fn unpause(&mut self) {
        self.paused = false;
        self.clock.reset_phase();
    }

    /// Returns the new paused state.
    pub fn pause_toggle(&mut self) -> bool {
        if self.paused {
            self.unpause();
        } else {
            self.pause();
        }
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Sets the step length. Returns `false` and keeps the old length if
    /// `seconds` is not a positive finite number.
    pub fn set_step_length(&mut self, seconds: f64) -> bool {
        self.clock.set_period(seconds)
    }

    pub fn step_length(&self) -> f64 {
        self.clock.period()
    }

    /// Advances the clock by `samples`. Called from the render context.
    pub fn advance_clock(&mut self, samples: usize) {
        self.clock.advance(samples);
    }

    /// Drops a pending clock tick without moving.
    pub fn discard_tick(&mut self) {
        self.clock.take_due();
    }

    /// Consumes a pending clock tick and moves to the next active step.
    ///
    /// Ticks arriving while paused are discarded. The search for an active
    /// step covers one full lap, ending on the current step itself; if no
    /// step is active the cursor stays put and `None` is returned.
    pub fn tick(&mut self) -> Option<StepAdvance> {
        if !self.clock.take_due() || self.paused || self.steps.is_empty() {
            return None;
        }

        let len = self.steps.len();
        let index = (1..=len)
            .map(|offset| (self.current + offset) % len)
            .find(|i| self.steps[*i].active)?;

        self.current = index;
        let mode = self.steps[index].mode;
        log::trace!("step {} ({:?})", index, mode);
        Some(StepAdvance { index, mode })
    }

    /// Plays the step at `index`: a chord step sounds all its notes on the
    /// pool, an arp step releases the pattern voices and hands its notes to
    /// `arp`. Voices held by live keys are left alone.
    pub fn play_step<V: Voice, const P: usize>(
        &self,
        index: usize,
        pool: &mut VoicePool<V, P>,
        arp: &mut ArpEngine,
    ) {
        let Some(step) = self.steps.get(index) else {
            return;
        };
        match step.mode {
            StepMode::Chord => {
                let claimed = pool.play_chord(&step.notes);
                let wanted = step.notes.iter().filter(|s| !s.is_rest()).count();
                if claimed < wanted {
                    log::warn!("step {} wanted {} voices, got {}", index, wanted, claimed);
                }
            }
            StepMode::Arp => {
                pool.release_pattern();
                arp.set_notes(step.notes.iter().copied());
            }
        }
    }
}
