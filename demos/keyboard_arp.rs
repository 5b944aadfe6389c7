//! Interactive polyphonic synth with arpeggiator and step sequencer.
//!
//! The computer keyboard stands in for a MIDI controller: note keys send
//! note on/off, other keys send the controller numbers of the default
//! control map.
//!
//! Requires a terminal that reports key releases (kitty keyboard protocol).

mod common;

use anyhow::Result;
use common::{
    DemoAudio, KeyAction, KeyboardConfig, TerminalDisplay, is_quit_key, key_to_midi_note,
    run_interactive_demo,
};
use crossterm::event::{KeyCode, KeyEventKind};
use polyarp::router::InputEvent;
use polyarp::synthesis::SynthVoice;
use polyarp::{Synth, SynthConfig, WaveShape};

const VOICES: usize = 6;

/// Redraw at least this often so sequencer progress shows up.
const REDRAW_EVERY: u32 = 10;

const HELP: &[&str] = &[
    "Notes: A W S E D F T G Y H U J K O L",
    "",
    "1 play mode    2 arp mode     3 edit     4 pause",
    "[ ] step       - = del/add step",
    "z pop note     x rest         c step mode  v step on/off",
    "n m wave       up/down cutoff left/right arp speed",
    "",
    "Q/ESC quit",
];

struct DemoState {
    synth: Synth<SynthVoice, VOICES>,
    wave: u8,
    cutoff: u8,
    arp_length: u8,
    dirty: bool,
}

impl DemoState {
    fn new(sample_rate: u32) -> Result<Self> {
        let config = SynthConfig::default().with_sample_rate(sample_rate);
        let synth = Synth::new(&config, || SynthVoice::new(sample_rate))?;
        Ok(Self {
            synth,
            wave: WaveShape::PolyBlepSaw as u8,
            cutoff: 76,
            arp_length: 60,
            dirty: true,
        })
    }

    fn send(&mut self, event: InputEvent) {
        if self.synth.handle_event(event) {
            self.dirty = true;
        }
    }

    fn press(&mut self, controller: u8) {
        self.send(InputEvent::control(controller, 127));
        self.dirty = true;
    }

    fn nudge(&mut self, controller: u8, up: bool) {
        self.send(InputEvent::control(controller, if up { 65 } else { 63 }));
        self.dirty = true;
    }
}

impl DemoAudio for DemoState {
    fn render(&mut self, out: &mut [f64]) {
        self.synth.render_block(out);
        for sample in out.iter_mut() {
            *sample *= 0.3;
        }
    }
}

fn step(value: u8, up: bool, by: u8, max: u8) -> u8 {
    if up {
        value.saturating_add(by).min(max)
    } else {
        value.saturating_sub(by)
    }
}

fn main() -> Result<()> {
    let mut screen = TerminalDisplay::new(HELP);
    let mut frames = 0u32;

    run_interactive_demo(
        DemoState::new,
        KeyboardConfig::with_enhancements(),
        |_state| Ok(()),
        |state, key_event| {
            if is_quit_key(key_event.code) {
                return Ok(KeyAction::Exit);
            }
            if key_event.kind == KeyEventKind::Repeat {
                return Ok(KeyAction::Continue);
            }
            let pressed = key_event.kind == KeyEventKind::Press;

            let Ok(mut s) = state.lock() else {
                return Ok(KeyAction::Exit);
            };

            if let KeyCode::Char(c) = key_event.code
                && let Some(pitch) = key_to_midi_note(c)
            {
                let event = if pressed {
                    InputEvent::note_on(0, pitch, 100)
                } else {
                    InputEvent::note_off(0, pitch)
                };
                s.send(event);
                return Ok(KeyAction::Continue);
            }

            if !pressed {
                return Ok(KeyAction::Continue);
            }

            match key_event.code {
                KeyCode::Char('1') => s.press(20),
                KeyCode::Char('2') => s.press(115),
                KeyCode::Char('3') => s.press(21),
                KeyCode::Char('4') => s.press(113),
                KeyCode::Char('z') => s.press(22),
                KeyCode::Char('x') => s.press(23),
                KeyCode::Char('c') => s.press(24),
                KeyCode::Char('v') => s.press(25),
                KeyCode::Char('[') => s.nudge(114, false),
                KeyCode::Char(']') => s.nudge(114, true),
                KeyCode::Char('-') => s.nudge(112, false),
                KeyCode::Char('=') => s.nudge(112, true),
                KeyCode::Char(c @ ('n' | 'm')) => {
                    s.wave = step(s.wave, c == 'm', 1, WaveShape::COUNT as u8 - 1);
                    // One knob zone per shape
                    let value = s.wave * 16;
                    s.send(InputEvent::control(74, value));
                    s.dirty = true;
                }
                KeyCode::Up | KeyCode::Down => {
                    s.cutoff = step(s.cutoff, key_event.code == KeyCode::Up, 8, 127);
                    let value = s.cutoff;
                    s.send(InputEvent::control(71, value));
                }
                KeyCode::Left | KeyCode::Right => {
                    // Right is faster, so shorter notes
                    s.arp_length = step(s.arp_length, key_event.code == KeyCode::Left, 8, 127);
                    let value = s.arp_length;
                    s.send(InputEvent::control(16, value));
                }
                _ => {}
            }
            Ok(KeyAction::Continue)
        },
        |state| {
            frames += 1;
            let Ok(mut s) = state.lock() else {
                return Ok(());
            };
            s.synth.update();
            if s.dirty {
                screen.draw_help()?;
            }
            if s.dirty || frames % REDRAW_EVERY == 0 {
                s.synth.redraw(&mut screen);
                s.dirty = false;
            }
            Ok(())
        },
    )
}
