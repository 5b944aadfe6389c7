//! Shared helpers for the integration tests.

#![allow(dead_code)]

use polyarp::music::Voice;
use polyarp::router::InputEvent;
use polyarp::{Patch, Synth, SynthConfig, VoiceParams};

/// Controller numbers from the default control map.
pub mod cc {
    pub const MODE: u8 = 20;
    pub const EDIT: u8 = 21;
    pub const POP: u8 = 22;
    pub const REST: u8 = 23;
    pub const STEP_MODE: u8 = 24;
    pub const STEP_ACTIVE: u8 = 25;
    pub const STEP_ADD_DELETE: u8 = 112;
    pub const PAUSE: u8 = 113;
    pub const NAVIGATE: u8 = 114;
    pub const ARP_MODE: u8 = 115;
}

/// Voice with no release tail: it outputs 1.0 while gated.
#[derive(Debug, Default)]
pub struct GateVoice {
    gate: bool,
}

impl Voice for GateVoice {
    fn configure(&mut self, _patch: &Patch) {}

    fn note_on(&mut self, _pitch: u8, _velocity: u8) {
        self.gate = true;
    }

    fn retrigger(&mut self) {}

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn is_active(&self) -> bool {
        self.gate
    }

    fn render_sample(&mut self, _params: &VoiceParams) -> f64 {
        if self.gate { 1.0 } else { 0.0 }
    }
}

/// Samples per update in [`run`].
pub const BLOCK: usize = 10;

/// 1 kHz with an arp note every block and a step every two blocks.
pub fn config() -> SynthConfig {
    SynthConfig::default()
        .with_sample_rate(1000)
        .with_arp_note_length(0.01)
        .with_seq_step_length(0.02)
        .with_initial_steps(4)
}

pub fn synth<const P: usize>() -> Synth<GateVoice, P> {
    Synth::new(&config(), GateVoice::default).unwrap()
}

/// Renders one block and consumes the resulting ticks.
pub fn step<const P: usize>(synth: &mut Synth<GateVoice, P>) {
    let mut block = [0.0; BLOCK];
    synth.render_block(&mut block);
    synth.update();
}

/// Runs `blocks` render/update cycles.
pub fn run<const P: usize>(synth: &mut Synth<GateVoice, P>, blocks: usize) {
    for _ in 0..blocks {
        step(synth);
    }
}

/// Runs one block at a time, recording the lead voice's pitch after each.
pub fn lead_pitches<const P: usize>(synth: &mut Synth<GateVoice, P>, blocks: usize) -> Vec<u8> {
    (0..blocks)
        .filter_map(|_| {
            step(synth);
            synth.pool().gated_pitch(0)
        })
        .collect()
}

pub fn press<const P: usize>(synth: &mut Synth<GateVoice, P>, controller: u8) -> bool {
    synth.handle_event(InputEvent::control(controller, 127))
}

pub fn keys_down<const P: usize>(synth: &mut Synth<GateVoice, P>, pitches: &[u8]) {
    for &pitch in pitches {
        synth.handle_event(InputEvent::note_on(0, pitch, 100));
    }
}

pub fn keys_up<const P: usize>(synth: &mut Synth<GateVoice, P>, pitches: &[u8]) {
    for &pitch in pitches {
        synth.handle_event(InputEvent::note_off(0, pitch));
    }
}
