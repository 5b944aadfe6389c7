//! Routing of decoded MIDI input to the voice pool, arpeggiator and
//! sequencer.
//!
//! The router owns the top-level play mode, the edit flag and the set of held
//! keys. Every event goes through [`EventRouter::handle`], a single `match`
//! over the event kind and the current mode.

use std::collections::HashMap;

use crate::engine::Instrument;
use crate::music::{HeldNotes, NoteEvent, StepMode, Voice};

/// Top-level playback mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayMode {
    /// Every key sounds on its own voice
    #[default]
    Keyboard,
    /// Held keys feed the arpeggiator
    Arp,
    /// The step sequencer plays; keys still sound live
    Sequenced,
}

impl PlayMode {
    pub fn next(self) -> Self {
        match self {
            PlayMode::Keyboard => PlayMode::Arp,
            PlayMode::Arp => PlayMode::Sequenced,
            PlayMode::Sequenced => PlayMode::Keyboard,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlayMode::Keyboard => "keys",
            PlayMode::Arp => "arp",
            PlayMode::Sequenced => "seq",
        }
    }
}

/// A decoded input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    NoteOn(NoteEvent),
    NoteOff { channel: u8, pitch: u8 },
    ControlChange { controller: u8, value: u8 },
}

impl InputEvent {
    pub fn note_on(channel: u8, pitch: u8, velocity: u8) -> Self {
        InputEvent::NoteOn(NoteEvent::new(channel, pitch, velocity))
    }

    pub fn note_off(channel: u8, pitch: u8) -> Self {
        InputEvent::NoteOff { channel, pitch }
    }

    pub fn control(controller: u8, value: u8) -> Self {
        InputEvent::ControlChange { controller, value }
    }
}

/// Logical controls a controller number can be bound to.
///
/// Knobs are absolute (0-127). Buttons act only on value 127. Encoders are
/// relative: values above 64 step forward, below 64 step back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Control {
    WaveShape,
    Detune,
    FilterCutoff,
    FilterResonance,
    FilterEnvDepth,
    AmpAttack,
    AmpDecay,
    AmpSustain,
    AmpRelease,
    FilterAttack,
    FilterDecay,
    FilterSustain,
    FilterRelease,
    /// Button
    ArpModeCycle,
    ArpNoteLength,
    /// Button
    ModeToggle,
    /// Button
    EditToggle,
    SeqStepLength,
    /// Button
    SeqPauseToggle,
    /// Encoder: forward adds, back deletes
    StepAddDelete,
    /// Encoder
    StepNavigate,
    /// Button, edit mode only
    PopNote,
    /// Button, edit mode only
    PushRest,
    /// Button, edit mode only
    StepModeToggle,
    /// Button, edit mode only
    StepActiveToggle,
}

/// Controller number to [`Control`] table.
///
/// The default binds the Arturia MiniLab mkII factory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlMap {
    bindings: HashMap<u8, Control>,
}

impl ControlMap {
    /// Creates a map with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Binds `controller` to `control`, returning the previous binding.
    pub fn bind(&mut self, controller: u8, control: Control) -> Option<Control> {
        self.bindings.insert(controller, control)
    }

    pub fn unbind(&mut self, controller: u8) -> Option<Control> {
        self.bindings.remove(&controller)
    }

    pub fn get(&self, controller: u8) -> Option<Control> {
        self.bindings.get(&controller).copied()
    }

    /// Controller numbers bound to `control`, in ascending order.
    pub fn controllers_for(&self, control: Control) -> Vec<u8> {
        let mut found: Vec<u8> = self
            .bindings
            .iter()
            .filter(|(_, c)| **c == control)
            .map(|(cc, _)| *cc)
            .collect();
        found.sort_unstable();
        found
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for ControlMap {
    fn default() -> Self {
        let mut map = Self::empty();
        for (cc, control) in [
            (1, Control::Detune),
            (16, Control::ArpNoteLength),
            (17, Control::AmpRelease),
            (18, Control::SeqStepLength),
            (19, Control::FilterResonance),
            (20, Control::ModeToggle),
            (21, Control::EditToggle),
            (22, Control::PopNote),
            (23, Control::PushRest),
            (24, Control::StepModeToggle),
            (25, Control::StepActiveToggle),
            (71, Control::FilterCutoff),
            (72, Control::FilterDecay),
            (73, Control::AmpAttack),
            (74, Control::WaveShape),
            (75, Control::AmpDecay),
            (76, Control::FilterEnvDepth),
            (77, Control::AmpSustain),
            (79, Control::FilterAttack),
            (91, Control::FilterSustain),
            (93, Control::FilterRelease),
            (112, Control::StepAddDelete),
            (113, Control::SeqPauseToggle),
            (114, Control::StepNavigate),
            (115, Control::ArpModeCycle),
        ] {
            map.bind(cc, control);
        }
        map
    }
}

/// Controller value to engineering unit conversions.
pub mod scale {
    use crate::config::WaveShape;

    /// Shortest envelope stage, in seconds.
    pub const MIN_ENV_TIME: f64 = 0.007;

    /// 0-127 to 0.0..=1.0.
    pub fn unit(value: u8) -> f64 {
        f64::from(value.min(127)) / 127.0
    }

    /// Splits the knob range into one zone per wave shape.
    pub fn wave_shape(value: u8) -> WaveShape {
        let zone = (usize::from(value.min(127)) * WaveShape::COUNT) / 127;
        WaveShape::from_index(zone.min(WaveShape::COUNT - 1) as u8)
    }

    /// 1.0 (unison) to 2.0 (octave).
    pub fn detune(value: u8) -> f64 {
        1.0 + unit(value)
    }

    /// Never fully zero, never quite 1.0.
    pub fn resonance(value: u8) -> f64 {
        (1.0 + f64::from(value.min(127))) / 129.0
    }

    pub fn env_time(value: u8) -> f64 {
        MIN_ENV_TIME + unit(value)
    }

    pub fn arp_note_length(value: u8) -> f64 {
        0.002 + 0.25 * unit(value)
    }

    pub fn step_length(value: u8) -> f64 {
        0.002 + 5.0 * unit(value)
    }

    /// Decodes a relative encoder value (65 = +1, 63 = -1, 64 = 0).
    pub fn relative(value: u8) -> i32 {
        i32::from(value.min(127)) - 64
    }

    pub fn is_press(value: u8) -> bool {
        value == 127
    }
}

/// Dispatches input events.
#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    map: ControlMap,
    mode: PlayMode,
    editing: bool,
    /// Whether leaving edit mode should resume the sequencer
    resume_after_edit: bool,
    held: HeldNotes,
}

impl EventRouter {
    pub fn new(map: ControlMap) -> Self {
        Self {
            map,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn held(&self) -> &HeldNotes {
        &self.held
    }

    pub fn control_map(&self) -> &ControlMap {
        &self.map
    }

    pub fn control_map_mut(&mut self) -> &mut ControlMap {
        &mut self.map
    }

    /// Whether arpeggiator ticks should reach the voices.
    ///
    /// True in arp mode, and in sequenced or edit mode while the current
    /// step is an arp step.
    pub fn arp_drives(&self, current_step_mode: Option<StepMode>) -> bool {
        let on_arp_step = current_step_mode == Some(StepMode::Arp);
        if self.editing {
            return on_arp_step;
        }
        match self.mode {
            PlayMode::Keyboard => false,
            PlayMode::Arp => true,
            PlayMode::Sequenced => on_arp_step,
        }
    }

    /// Whether sequencer step landings should be played.
    pub fn sequencer_drives(&self) -> bool {
        self.mode == PlayMode::Sequenced && !self.editing
    }

    /// Handles one event. Returns `true` when something shown on the
    /// display changed.
    pub fn handle<V: Voice, const P: usize>(
        &mut self,
        event: InputEvent,
        inst: &mut Instrument<V, P>,
    ) -> bool {
        match event {
            // Running-status keyboards send note-off as velocity 0
            InputEvent::NoteOn(note) if note.velocity == 0 => {
                self.note_off(note.pitch, inst);
                false
            }
            InputEvent::NoteOn(note) => self.note_on(note, inst),
            InputEvent::NoteOff { pitch, .. } => {
                self.note_off(pitch, inst);
                false
            }
            InputEvent::ControlChange { controller, value } => match self.map.get(controller) {
                Some(control) => self.control(control, value, inst),
                None => {
                    log::trace!("unbound controller {} = {}", controller, value);
                    false
                }
            },
        }
    }

    fn note_on<V: Voice, const P: usize>(
        &mut self,
        note: NoteEvent,
        inst: &mut Instrument<V, P>,
    ) -> bool {
        if self.editing {
            if !inst.seq.push_note(note) {
                log::debug!("step {} is full", inst.seq.current_index());
            }
            self.refresh_arp_from_step(inst);
            return true;
        }

        self.held.press(note);
        match self.mode {
            PlayMode::Keyboard | PlayMode::Sequenced => {
                inst.pool.key_down(note);
            }
            PlayMode::Arp => inst.arp.set_notes(self.held.iter().copied()),
        }
        false
    }

    fn note_off<V: Voice, const P: usize>(&mut self, pitch: u8, inst: &mut Instrument<V, P>) {
        if !self.held.release(pitch) {
            return;
        }
        match self.mode {
            PlayMode::Keyboard | PlayMode::Sequenced => {
                inst.pool.key_up(pitch);
            }
            PlayMode::Arp => inst.arp.set_notes(self.held.iter().copied()),
        }
    }

    fn control<V: Voice, const P: usize>(
        &mut self,
        control: Control,
        value: u8,
        inst: &mut Instrument<V, P>,
    ) -> bool {
        log::debug!("{:?} = {}", control, value);

        match control {
            Control::WaveShape => {
                let shape = scale::wave_shape(value);
                if shape == inst.patch.wave_shape {
                    return false;
                }
                inst.patch.wave_shape = shape;
                inst.apply_patch();
            }
            Control::Detune => {
                inst.patch.detune = scale::detune(value);
                inst.apply_patch();
            }
            Control::FilterCutoff => inst.params.cutoff = scale::unit(value),
            Control::FilterResonance => inst.params.resonance = scale::resonance(value),
            Control::FilterEnvDepth => inst.params.env_depth = scale::unit(value),
            Control::AmpAttack => {
                inst.patch.amp_env.attack = scale::env_time(value);
                inst.apply_patch();
            }
            Control::AmpDecay => {
                inst.patch.amp_env.decay = scale::env_time(value);
                inst.apply_patch();
            }
            Control::AmpSustain => {
                inst.patch.amp_env.sustain = scale::unit(value);
                inst.apply_patch();
            }
            Control::AmpRelease => {
                inst.patch.amp_env.release = scale::env_time(value);
                inst.apply_patch();
            }
            Control::FilterAttack => {
                inst.patch.filter_env.attack = scale::env_time(value);
                inst.apply_patch();
            }
            Control::FilterDecay => {
                inst.patch.filter_env.decay = scale::env_time(value);
                inst.apply_patch();
            }
            Control::FilterSustain => {
                inst.patch.filter_env.sustain = scale::unit(value);
                inst.apply_patch();
            }
            Control::FilterRelease => {
                inst.patch.filter_env.release = scale::env_time(value);
                inst.apply_patch();
            }
            Control::ArpNoteLength => {
                inst.arp.set_note_length(scale::arp_note_length(value));
            }
            Control::SeqStepLength => {
                inst.seq.set_step_length(scale::step_length(value));
            }
            Control::StepAddDelete => match scale::relative(value).signum() {
                1 => {
                    inst.seq.add_step();
                }
                -1 => {
                    inst.seq.delete_step();
                    self.refresh_arp_from_step(inst);
                }
                _ => return false,
            },
            Control::StepNavigate => {
                let delta = scale::relative(value);
                if delta == 0 {
                    return false;
                }
                inst.seq.step_forward(delta);
                self.refresh_arp_from_step(inst);
            }
            _ if !scale::is_press(value) => return false,
            Control::ArpModeCycle => {
                inst.arp.next_mode();
            }
            Control::ModeToggle => self.cycle_mode(inst),
            Control::EditToggle => self.toggle_edit(inst),
            Control::SeqPauseToggle => {
                let paused = inst.seq.pause_toggle();
                log::debug!("sequencer {}", if paused { "paused" } else { "running" });
            }
            _ if !self.editing => return false,
            Control::PopNote => {
                inst.seq.pop_note();
                self.refresh_arp_from_step(inst);
            }
            Control::PushRest => {
                inst.seq.push_rest();
                self.refresh_arp_from_step(inst);
            }
            Control::StepModeToggle => {
                inst.seq.toggle_step_mode();
                inst.pool.release_all();
                self.refresh_arp_from_step(inst);
            }
            Control::StepActiveToggle => {
                inst.seq.toggle_step_active();
            }
        }
        true
    }

    fn cycle_mode<V: Voice, const P: usize>(&mut self, inst: &mut Instrument<V, P>) {
        let next = self.mode.next();
        log::debug!("play mode {} -> {}", self.mode.name(), next.name());
        self.mode = next;

        inst.pool.release_all();
        inst.arp.clear();
        if next == PlayMode::Arp {
            inst.arp.set_notes(self.held.iter().copied());
        }
    }

    fn toggle_edit<V: Voice, const P: usize>(&mut self, inst: &mut Instrument<V, P>) {
        self.editing = !self.editing;
        log::debug!("edit mode {}", if self.editing { "on" } else { "off" });

        inst.pool.release_all();
        inst.arp.clear();
        if self.editing {
            self.resume_after_edit = !inst.seq.is_paused();
            inst.seq.pause();
            self.refresh_arp_from_step(inst);
        } else {
            if self.resume_after_edit {
                inst.seq.unpause();
            }
            if self.mode == PlayMode::Arp {
                inst.arp.set_notes(self.held.iter().copied());
            }
        }
    }

    /// While editing, keeps the arpeggiator loaded with the current step's
    /// notes if that step is an arp step.
    fn refresh_arp_from_step<V: Voice, const P: usize>(&self, inst: &mut Instrument<V, P>) {
        if !self.editing {
            return;
        }
        match inst.seq.current_step() {
            Some(step) if step.mode == StepMode::Arp => {
                inst.arp.set_notes(step.notes.iter().copied());
            }
            _ => inst.arp.clear(),
        }
    }
}
