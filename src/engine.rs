//! The assembled instrument.
//!
//! [`Synth`] ties the voice pool, arpeggiator and sequencer to the event
//! router. It has two sides:
//!
//! - **Render side**: [`Synth::render_block`] advances the clocks and fills an
//!   audio buffer. It never allocates, blocks or logs.
//! - **Control side**: [`Synth::handle_event`] applies input events and
//!   [`Synth::update`] consumes the clock ticks latched by the render side.
//!
//! A host usually calls `render_block` from its audio callback and
//! `handle_event`/`update` from a polling loop, sharing the synth behind
//! whatever handoff it prefers.

use crate::config::{Patch, SynthConfig, VoiceParams};
use crate::display::Display;
use crate::error::Error;
use crate::music::{ArpEngine, StepSequencer, Voice, VoicePool};
use crate::router::{ControlMap, EventRouter, InputEvent, PlayMode};

/// The parts the event router drives.
pub struct Instrument<V: Voice, const P: usize> {
    pub pool: VoicePool<V, P>,
    pub arp: ArpEngine,
    pub seq: StepSequencer,
    pub patch: Patch,
    /// Snapshot handed to every voice on each rendered sample
    pub params: VoiceParams,
}

impl<V: Voice, const P: usize> Instrument<V, P> {
    /// Builds the parts from `config` without validating it.
    pub fn new(config: &SynthConfig, factory: impl FnMut() -> V) -> Self {
        let mut pool = VoicePool::new(factory);
        pool.configure(&config.patch);
        Self {
            pool,
            arp: ArpEngine::new(config.arp_note_length, config.sample_rate, config.arp_seed),
            seq: StepSequencer::new(
                config.seq_step_length,
                config.sample_rate,
                config.initial_steps,
            ),
            patch: config.patch,
            params: config.params,
        }
    }

    /// Sends the current patch to every voice.
    pub fn apply_patch(&mut self) {
        self.pool.configure(&self.patch);
    }
}

/// A complete polyphonic instrument with `P` voices.
///
/// # Examples
///
/// ```
/// use polyarp::music::Voice;
/// use polyarp::router::InputEvent;
/// use polyarp::{Patch, Synth, SynthConfig, VoiceParams};
///
/// #[derive(Default)]
/// struct Click(bool);
///
/// impl Voice for Click {
///     fn configure(&mut self, _patch: &Patch) {}
///     fn note_on(&mut self, _pitch: u8, _velocity: u8) {
///         self.0 = true;
///     }
///     fn retrigger(&mut self) {}
///     fn note_off(&mut self) {
///         self.0 = false;
///     }
///     fn is_active(&self) -> bool {
///         self.0
///     }
///     fn render_sample(&mut self, _params: &VoiceParams) -> f64 {
///         if self.0 { 1.0 } else { 0.0 }
///     }
/// }
///
/// let mut synth = Synth::<Click, 4>::new(&SynthConfig::default(), Click::default).unwrap();
/// synth.handle_event(InputEvent::note_on(0, 60, 100));
///
/// let mut block = [0.0; 32];
/// synth.render_block(&mut block);
/// assert_eq!(block[0], 0.25);
/// ```
pub struct Synth<V: Voice, const P: usize> {
    inst: Instrument<V, P>,
    router: EventRouter,
}

impl<V: Voice, const P: usize> Synth<V, P> {
    /// Validates `config` and builds the instrument, creating each voice
    /// with `factory`.
    pub fn new(config: &SynthConfig, factory: impl FnMut() -> V) -> Result<Self, Error> {
        config.validate()?;
        log::debug!(
            "synth: {} voices at {} Hz, {} steps",
            P,
            config.sample_rate,
            config.initial_steps
        );
        Ok(Self {
            inst: Instrument::new(config, factory),
            router: EventRouter::default(),
        })
    }

    /// Replaces the controller table.
    pub fn with_control_map(mut self, map: ControlMap) -> Self {
        *self.router.control_map_mut() = map;
        self
    }

    /// Advances the arpeggiator and sequencer clocks by `out.len()` samples
    /// and renders the voices into `out`.
    pub fn render_block(&mut self, out: &mut [f64]) {
        self.inst.arp.advance_clock(out.len());
        self.inst.seq.advance_clock(out.len());
        self.inst.pool.render_block(out, &self.inst.params);
    }

    /// Applies one input event. Returns `true` when the display should be
    /// redrawn.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        self.router.handle(event, &mut self.inst)
    }

    /// Consumes pending clock ticks: the sequencer first, so an arp step it
    /// lands on is heard on the same update, then the arpeggiator.
    ///
    /// Ticks that arrive while their component is not driving the voices
    /// are dropped. Outside sequenced playback the sequencer cursor stays
    /// where it is.
    pub fn update(&mut self) {
        let inst = &mut self.inst;

        if !self.router.sequencer_drives() {
            inst.seq.discard_tick();
        } else if let Some(advance) = inst.seq.tick() {
            inst.seq.play_step(advance.index, &mut inst.pool, &mut inst.arp);
        }

        let step_mode = inst.seq.current_step().map(|s| s.mode);
        if let Some(slot) = inst.arp.tick()
            && self.router.arp_drives(step_mode)
        {
            inst.pool.play_slot(slot);
        }
    }

    /// Writes the status lines to `display`.
    ///
    /// Normally this shows the play mode, arp mode, wave shape and sequence
    /// position. In edit mode the first line lists the current step's notes
    /// and the second marks the current step with `^`.
    pub fn redraw(&self, display: &mut impl Display) {
        let (top, bottom) = if self.router.is_editing() {
            self.edit_lines()
        } else {
            self.status_lines()
        };
        display.write_line(0, &top);
        display.write_line(1, &bottom);
        display.flush();
    }

    fn status_lines(&self) -> (String, String) {
        let seq = &self.inst.seq;
        let top = format!(
            "{} {}",
            self.router.mode().name(),
            self.inst.arp.mode().name()
        );
        let bottom = format!(
            "{} {}/{}{}",
            self.inst.patch.wave_shape.name(),
            seq.current_index() + 1,
            seq.len(),
            if seq.is_paused() { " ||" } else { "" }
        );
        (top, bottom)
    }

    fn edit_lines(&self) -> (String, String) {
        let seq = &self.inst.seq;

        let top = seq
            .current_step()
            .map(|step| {
                step.notes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let bottom = (0..seq.len())
            .map(|i| if i == seq.current_index() { '^' } else { '-' })
            .collect();
        (top, bottom)
    }

    pub fn mode(&self) -> PlayMode {
        self.router.mode()
    }

    pub fn is_editing(&self) -> bool {
        self.router.is_editing()
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn pool(&self) -> &VoicePool<V, P> {
        &self.inst.pool
    }

    pub fn arp(&self) -> &ArpEngine {
        &self.inst.arp
    }

    pub fn sequencer(&self) -> &StepSequencer {
        &self.inst.seq
    }

    /// Mutable access to the sequencer, for programming steps directly.
    pub fn sequencer_mut(&mut self) -> &mut StepSequencer {
        &mut self.inst.seq
    }

    pub fn patch(&self) -> &Patch {
        &self.inst.patch
    }

    pub fn set_patch(&mut self, patch: Patch) {
        self.inst.patch = patch;
        self.inst.apply_patch();
    }

    pub fn params(&self) -> &VoiceParams {
        &self.inst.params
    }

    pub fn set_params(&mut self, params: VoiceParams) {
        self.inst.params = params;
    }
}
