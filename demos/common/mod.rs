//! Common utilities for the interactive demos.

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, StreamConfig};
use crossterm::{
    ExecutableCommand, QueueableCommand,
    cursor::MoveTo,
    event::{
        self, Event, KeyCode, KeyEvent, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    style::Print,
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use std::io::{Stdout, Write, stdout};
use std::panic;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Largest block rendered in one go by the audio callback.
const MAX_BLOCK: usize = 1024;

/// Audio state that renders whole blocks of mono samples.
pub trait DemoAudio: Send + 'static {
    fn render(&mut self, out: &mut [f64]);
}

/// Configuration for keyboard enhancements (needed for detecting key press/release).
#[derive(Default)]
pub struct KeyboardConfig {
    pub enable_enhancements: bool,
}

impl KeyboardConfig {
    pub fn with_enhancements() -> Self {
        Self {
            enable_enhancements: true,
        }
    }
}

/// Key handling result that controls the event loop
pub enum KeyAction {
    Continue,
    Exit,
}

/// Runs an interactive demo with terminal UI.
///
/// `make_state` receives the output device's sample rate. `on_idle` runs
/// on every pass of the event loop, roughly every 10 ms, whether or not a
/// key arrived.
pub fn run_interactive_demo<S, M, F, K, I>(
    make_state: M,
    keyboard_config: KeyboardConfig,
    initial_ui: F,
    key_handler: K,
    mut on_idle: I,
) -> Result<()>
where
    S: DemoAudio,
    M: FnOnce(u32) -> Result<S>,
    F: FnOnce(&Arc<Mutex<S>>) -> Result<()>,
    K: Fn(&Arc<Mutex<S>>, &KeyEvent) -> Result<KeyAction>,
    I: FnMut(&Arc<Mutex<S>>) -> Result<()>,
{
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))?;

    let config = device.default_output_config()?;
    let state = Arc::new(Mutex::new(make_state(config.sample_rate().0)?));

    let _stream = match config.sample_format() {
        SampleFormat::F32 => create_audio_stream::<f32, S>(&device, &config.into(), state.clone())?,
        SampleFormat::I16 => create_audio_stream::<i16, S>(&device, &config.into(), state.clone())?,
        SampleFormat::U16 => create_audio_stream::<u16, S>(&device, &config.into(), state.clone())?,
        sample_format => {
            return Err(anyhow::anyhow!(
                "Unsupported sample format: {}",
                sample_format
            ));
        }
    };

    // Keyboard enhancements must come before the alternate screen
    if keyboard_config.enable_enhancements {
        stdout().execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))?;
    }

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(crossterm::cursor::Hide)?;

    let has_enhancements = keyboard_config.enable_enhancements;
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        cleanup_terminal(has_enhancements);
        original_hook(panic_info);
    }));

    initial_ui(&state)?;

    loop {
        if event::poll(Duration::from_millis(10))?
            && let Event::Key(key_event) = event::read()?
        {
            match key_handler(&state, &key_event)? {
                KeyAction::Continue => {}
                KeyAction::Exit => break,
            }
        }
        on_idle(&state)?;
    }

    cleanup_terminal(keyboard_config.enable_enhancements);

    Ok(())
}

/// Creates an audio stream that renders blocks from the demo state.
fn create_audio_stream<T, S>(
    device: &cpal::Device,
    config: &StreamConfig,
    state: Arc<Mutex<S>>,
) -> Result<cpal::Stream>
where
    T: Sample + FromSample<f64> + cpal::SizedSample,
    S: DemoAudio,
{
    let channels = config.channels as usize;
    let mut scratch = vec![0.0; MAX_BLOCK];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let Ok(mut state) = state.lock() else {
                data.fill(T::EQUILIBRIUM);
                return;
            };
            for chunk in data.chunks_mut(channels * MAX_BLOCK) {
                let frames = chunk.len() / channels;
                let block = &mut scratch[..frames];
                state.render(block);
                for (frame, sample) in chunk.chunks_mut(channels).zip(block.iter()) {
                    let value: T = T::from_sample(*sample);
                    frame.fill(value);
                }
            }
        },
        |err| eprintln!("Audio stream error: {}", err),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

/// Maps the home row to a chromatic octave starting at C4, with the row
/// above as the black keys.
pub fn key_to_midi_note(c: char) -> Option<u8> {
    let note = match c.to_ascii_lowercase() {
        'a' => 60,
        'w' => 61,
        's' => 62,
        'e' => 63,
        'd' => 64,
        'f' => 65,
        't' => 66,
        'g' => 67,
        'y' => 68,
        'h' => 69,
        'u' => 70,
        'j' => 71,
        'k' => 72,
        'o' => 73,
        'l' => 74,
        _ => return None,
    };
    Some(note)
}

/// A [`polyarp::display::Display`] that draws its rows at the top of the
/// terminal, with free-form help text below.
pub struct TerminalDisplay {
    out: Stdout,
    help: &'static [&'static str],
}

impl TerminalDisplay {
    pub fn new(help: &'static [&'static str]) -> Self {
        Self {
            out: stdout(),
            help,
        }
    }

    /// Clears the screen and prints the help text.
    pub fn draw_help(&mut self) -> Result<()> {
        self.out.queue(Clear(ClearType::All))?;
        for (i, line) in self.help.iter().enumerate() {
            let row = (polyarp::display::ROWS + 1 + i) as u16;
            self.out.queue(MoveTo(0, row))?.queue(Print(line))?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl polyarp::display::Display for TerminalDisplay {
    fn write_line(&mut self, row: usize, text: &str) {
        let _ = self
            .out
            .queue(MoveTo(0, row as u16))
            .and_then(|out| out.queue(Clear(ClearType::CurrentLine)))
            .and_then(|out| out.queue(Print(text)));
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

/// Cleans up terminal state (cursor, alternate screen, raw mode).
fn cleanup_terminal(has_keyboard_enhancements: bool) {
    if has_keyboard_enhancements {
        let _ = stdout().execute(PopKeyboardEnhancementFlags);
    }
    let _ = stdout().execute(crossterm::cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Helper to check if a key code is a quit key (Q, ESC).
pub fn is_quit_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
}
