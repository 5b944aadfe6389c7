//! Programs a short step sequence and bounces it to a WAV file.
//!
//! Usage: cargo run --example bounce_sequence [output.wav]

use anyhow::{Context, Result};
use polyarp::music::{ArpMode, NoteEvent, Slot, StepMode};
use polyarp::router::InputEvent;
use polyarp::synthesis::SynthVoice;
use polyarp::{Synth, SynthConfig, note};

const SAMPLE_RATE: u32 = 44_100;
const BLOCK: usize = 256;
const SECONDS: f64 = 8.0;

fn chord(pitches: &[u8]) -> Vec<Slot> {
    pitches
        .iter()
        .map(|&p| Slot::Note(NoteEvent::new(0, p, 100)))
        .collect()
}

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "bounce.wav".to_string());

    let config = SynthConfig::default()
        .with_sample_rate(SAMPLE_RATE)
        .with_arp_note_length(0.125)
        .with_seq_step_length(1.0)
        .with_initial_steps(1);
    let mut synth = Synth::<SynthVoice, 6>::new(&config, || SynthVoice::new(SAMPLE_RATE))?;

    let steps: [(StepMode, Vec<Slot>); 4] = [
        (StepMode::Chord, chord(&[note!("C3"), note!("G3"), note!("E4")])),
        (
            StepMode::Arp,
            vec![
                Slot::from(NoteEvent::new(0, note!("A3"), 110)),
                Slot::Rest,
                Slot::from(NoteEvent::new(0, note!("C4"), 90)),
                Slot::from(NoteEvent::new(0, note!("E4"), 90)),
            ],
        ),
        (StepMode::Chord, chord(&[note!("F3"), note!("A3"), note!("C4")])),
        (
            StepMode::Arp,
            chord(&[note!("G3"), note!("B3"), note!("D4"), note!("F4")]),
        ),
    ];

    let seq = synth.sequencer_mut();
    for (i, (mode, notes)) in steps.into_iter().enumerate() {
        if i > 0 {
            seq.add_step();
            seq.step_forward(1);
        }
        for slot in notes {
            seq.push_note(slot);
        }
        if mode == StepMode::Arp {
            seq.toggle_step_mode();
        }
    }
    // The cursor is on the last step, so the first tick lands on step 0

    // Keys -> arp -> sequenced, then pick the ping-pong pattern
    synth.handle_event(InputEvent::control(20, 127));
    synth.handle_event(InputEvent::control(20, 127));
    while synth.arp().mode() != ArpMode::PingPong {
        synth.handle_event(InputEvent::control(115, 127));
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(&path, spec).with_context(|| format!("creating {}", path))?;

    let total = (SECONDS * f64::from(SAMPLE_RATE)) as usize;
    let mut block = [0.0; BLOCK];
    let mut peak: f64 = 0.0;
    for _ in 0..total / BLOCK {
        synth.render_block(&mut block);
        synth.update();
        for sample in block {
            let sample = (sample * 0.3).clamp(-1.0, 1.0);
            peak = peak.max(sample.abs());
            writer.write_sample((sample * f64::from(i16::MAX)) as i16)?;
        }
    }
    writer.finalize()?;

    println!("Wrote {} ({:.1} s, peak {:.2})", path, SECONDS, peak);
    Ok(())
}
