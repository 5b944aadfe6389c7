mod common;

use common::{BLOCK, cc, keys_down, keys_up, lead_pitches, press, run, step, synth};
use polyarp::display::TextBuffer;
use polyarp::music::{ArpMode, NoteEvent, Slot, StepMode};
use polyarp::router::InputEvent;
use polyarp::{PlayMode, Synth};

fn select_arp_mode<const P: usize>(synth: &mut Synth<common::GateVoice, P>, mode: ArpMode) {
    while synth.arp().mode() != mode {
        press(synth, cc::ARP_MODE);
    }
}

fn enter_arp_mode<const P: usize>(synth: &mut Synth<common::GateVoice, P>, mode: ArpMode) {
    press(synth, cc::MODE);
    assert_eq!(synth.mode(), PlayMode::Arp);
    select_arp_mode(synth, mode);
}

#[test]
fn test_keyboard_mode_plays_chords() {
    let mut synth = synth::<4>();
    keys_down(&mut synth, &[60, 64, 67]);
    assert_eq!(synth.pool().gated_count(), 3);

    keys_up(&mut synth, &[64]);
    assert!(synth.pool().is_note_playing(60));
    assert!(!synth.pool().is_note_playing(64));
    assert!(synth.pool().is_note_playing(67));

    // Arp and sequencer ticks do not touch the held chord
    run(&mut synth, 10);
    assert_eq!(synth.pool().gated_count(), 2);
}

#[test]
fn test_zero_velocity_releases() {
    let mut synth = synth::<4>();
    keys_down(&mut synth, &[60]);
    synth.handle_event(InputEvent::note_on(0, 60, 0));
    assert_eq!(synth.pool().gated_count(), 0);
    assert!(synth.router().held().is_empty());
}

#[test]
fn test_full_pool_drops_extra_notes() {
    let mut synth = synth::<2>();
    keys_down(&mut synth, &[60, 62, 64]);
    assert!(synth.pool().is_note_playing(60));
    assert!(synth.pool().is_note_playing(62));
    assert!(!synth.pool().is_note_playing(64));

    keys_up(&mut synth, &[60]);
    keys_down(&mut synth, &[65]);
    assert!(synth.pool().is_note_playing(65));
    assert_eq!(synth.pool().gated_count(), 2);
}

#[test]
fn test_arp_as_played() {
    let mut synth = synth::<4>();
    enter_arp_mode(&mut synth, ArpMode::AsPlayed);
    keys_down(&mut synth, &[67, 60, 64]);
    assert_eq!(synth.pool().gated_count(), 0);

    assert_eq!(lead_pitches(&mut synth, 6), [67, 60, 64, 67, 60, 64]);
    assert_eq!(synth.pool().gated_count(), 1);
}

#[test]
fn test_arp_ascending_and_descending() {
    let mut up = synth::<4>();
    enter_arp_mode(&mut up, ArpMode::Ascending);
    keys_down(&mut up, &[67, 60, 64]);
    assert_eq!(lead_pitches(&mut up, 4), [60, 64, 67, 60]);

    let mut down = synth::<4>();
    enter_arp_mode(&mut down, ArpMode::Descending);
    keys_down(&mut down, &[67, 60, 64]);
    assert_eq!(lead_pitches(&mut down, 4), [67, 64, 60, 67]);
}

#[test]
fn test_arp_ping_pong() {
    let mut synth = synth::<4>();
    enter_arp_mode(&mut synth, ArpMode::PingPong);
    keys_down(&mut synth, &[60, 64, 67, 71]);
    assert_eq!(
        lead_pitches(&mut synth, 8),
        [60, 64, 67, 71, 67, 64, 60, 64]
    );
}

#[test]
fn test_arp_random_is_seeded() {
    let pitches = [60, 64, 67];
    let draw = || {
        let mut synth = synth::<4>();
        enter_arp_mode(&mut synth, ArpMode::Random);
        keys_down(&mut synth, &pitches);
        lead_pitches(&mut synth, 50)
    };

    let first = draw();
    assert_eq!(first.len(), 50);
    assert!(first.iter().all(|p| pitches.contains(p)));
    assert!(first.iter().any(|p| *p != first[0]));
    assert_eq!(first, draw());
}

#[test]
fn test_arp_follows_held_notes() {
    let mut synth = synth::<4>();
    enter_arp_mode(&mut synth, ArpMode::Ascending);
    keys_down(&mut synth, &[60, 64]);
    assert_eq!(lead_pitches(&mut synth, 2), [60, 64]);

    // The cursor keeps its index when the list grows
    keys_down(&mut synth, &[62]);
    assert_eq!(lead_pitches(&mut synth, 3), [64, 60, 62]);

    // Nothing held: the next tick is a rest
    keys_up(&mut synth, &[60, 62, 64]);
    step(&mut synth);
    assert_eq!(synth.pool().gated_count(), 0);
}

#[test]
fn test_leaving_arp_mode_silences() {
    let mut synth = synth::<4>();
    enter_arp_mode(&mut synth, ArpMode::AsPlayed);
    keys_down(&mut synth, &[60]);
    step(&mut synth);
    assert!(synth.pool().is_note_playing(60));

    press(&mut synth, cc::MODE);
    assert_eq!(synth.mode(), PlayMode::Sequenced);
    assert_eq!(synth.pool().gated_count(), 0);
    assert!(synth.arp().notes().is_empty());
}

fn program_steps<const P: usize>(synth: &mut Synth<common::GateVoice, P>) {
    let seq = synth.sequencer_mut();
    seq.step_forward(1);
    seq.push_note(NoteEvent::new(0, 60, 100));
    seq.push_note(NoteEvent::new(0, 64, 100));
    seq.step_forward(1);
    seq.push_note(NoteEvent::new(0, 72, 100));
    seq.push_note(NoteEvent::new(0, 76, 100));
    seq.toggle_step_mode();
    seq.step_forward(-2);
}

#[test]
fn test_sequencer_chord_and_arp_steps() {
    let mut synth = synth::<4>();
    program_steps(&mut synth);
    press(&mut synth, cc::MODE);
    press(&mut synth, cc::MODE);
    assert_eq!(synth.mode(), PlayMode::Sequenced);

    // First step boundary lands on the chord step
    run(&mut synth, 2);
    assert_eq!(synth.sequencer().current_index(), 1);
    assert!(synth.pool().is_note_playing(60));
    assert!(synth.pool().is_note_playing(64));

    // Arp ticks are ignored on a chord step
    step(&mut synth);
    assert_eq!(synth.pool().gated_count(), 2);

    // The arp step hands its notes to the arpeggiator
    step(&mut synth);
    assert_eq!(synth.sequencer().current_index(), 2);
    assert_eq!(synth.pool().gated_pitch(0), Some(72));
    assert_eq!(synth.pool().gated_count(), 1);
    step(&mut synth);
    assert_eq!(synth.pool().gated_pitch(0), Some(76));

    // Step 3 and step 0 are empty, so playback wraps to step 1
    step(&mut synth);
    assert_eq!(synth.sequencer().current_index(), 1);
    assert!(synth.pool().is_note_playing(60));
    assert!(!synth.pool().is_note_playing(76));
}

#[test]
fn test_sequencer_without_active_steps_stays_put() {
    let mut synth = synth::<4>();
    press(&mut synth, cc::MODE);
    press(&mut synth, cc::MODE);

    run(&mut synth, 20);
    assert_eq!(synth.sequencer().current_index(), 0);
    assert_eq!(synth.pool().gated_count(), 0);
}

#[test]
fn test_paused_sequencer_discards_ticks() {
    let mut synth = synth::<4>();
    program_steps(&mut synth);
    press(&mut synth, cc::MODE);
    press(&mut synth, cc::MODE);

    press(&mut synth, cc::PAUSE);
    assert!(synth.sequencer().is_paused());
    run(&mut synth, 20);
    assert_eq!(synth.sequencer().current_index(), 0);
    assert_eq!(synth.pool().gated_count(), 0);

    press(&mut synth, cc::PAUSE);
    // A full step length passes before the first landing
    step(&mut synth);
    assert_eq!(synth.sequencer().current_index(), 0);
    step(&mut synth);
    assert_eq!(synth.sequencer().current_index(), 1);
}

#[test]
fn test_live_keys_sound_while_sequenced() {
    let mut synth = synth::<4>();
    program_steps(&mut synth);
    press(&mut synth, cc::MODE);
    press(&mut synth, cc::MODE);
    keys_down(&mut synth, &[48]);
    assert!(synth.pool().is_note_playing(48));

    // Chord step
    run(&mut synth, 2);
    assert!(synth.pool().is_note_playing(60));
    assert!(synth.pool().is_note_playing(48));
    assert_eq!(synth.pool().gated_count(), 3);

    // Arp step and its ticks
    run(&mut synth, 2);
    assert!(synth.pool().is_note_playing(72));
    assert!(synth.pool().is_note_playing(48));
    step(&mut synth);
    assert!(synth.pool().is_note_playing(76));
    assert!(synth.pool().is_note_playing(48));
    assert_eq!(synth.pool().gated_count(), 2);

    // Back on the chord step
    step(&mut synth);
    assert!(synth.pool().is_note_playing(64));
    assert!(synth.pool().is_note_playing(48));

    keys_up(&mut synth, &[48]);
    assert!(!synth.pool().is_note_playing(48));
    assert_eq!(synth.pool().gated_count(), 2);
}

#[test]
fn test_arp_rests_leave_live_keys() {
    let mut synth = synth::<4>();
    synth.sequencer_mut().toggle_step_mode();
    press(&mut synth, cc::MODE);
    press(&mut synth, cc::MODE);
    press(&mut synth, cc::PAUSE);

    keys_down(&mut synth, &[48]);
    run(&mut synth, 5);
    assert!(synth.pool().is_note_playing(48));
}

#[test]
fn test_sequencer_holds_position_outside_sequenced_mode() {
    let mut synth = synth::<4>();
    program_steps(&mut synth);

    run(&mut synth, 10);
    assert_eq!(synth.sequencer().current_index(), 0);

    press(&mut synth, cc::MODE);
    run(&mut synth, 10);
    assert_eq!(synth.sequencer().current_index(), 0);

    press(&mut synth, cc::MODE);
    run(&mut synth, 2);
    assert_eq!(synth.sequencer().current_index(), 1);
}

#[test]
fn test_edit_mode_programs_steps() {
    let mut synth = synth::<4>();
    assert!(press(&mut synth, cc::EDIT));
    assert!(synth.is_editing());
    assert!(synth.sequencer().is_paused());

    synth.handle_event(InputEvent::control(cc::NAVIGATE, 65));
    keys_down(&mut synth, &[60, 62]);
    press(&mut synth, cc::REST);
    keys_down(&mut synth, &[64]);
    press(&mut synth, cc::POP);

    // Notes go to the step, not to the voices
    assert_eq!(synth.pool().gated_count(), 0);
    let edited = synth.sequencer().step(1).unwrap();
    assert_eq!(
        edited.notes,
        [
            Slot::Note(NoteEvent::new(0, 60, 100)),
            Slot::Note(NoteEvent::new(0, 62, 100)),
            Slot::Rest,
        ]
    );
    assert!(edited.active);

    press(&mut synth, cc::STEP_ACTIVE);
    assert!(!synth.sequencer().step(1).unwrap().active);

    // Navigation wraps
    synth.handle_event(InputEvent::control(cc::NAVIGATE, 62));
    assert_eq!(synth.sequencer().current_index(), 3);

    assert!(press(&mut synth, cc::EDIT));
    assert!(!synth.is_editing());
    assert!(!synth.sequencer().is_paused());
}

#[test]
fn test_edit_mode_previews_arp_steps() {
    let mut synth = synth::<4>();
    press(&mut synth, cc::EDIT);
    press(&mut synth, cc::STEP_MODE);
    assert_eq!(
        synth.sequencer().current_step().map(|s| s.mode),
        Some(StepMode::Arp)
    );

    keys_down(&mut synth, &[60, 64]);
    assert_eq!(lead_pitches(&mut synth, 3), [60, 64, 60]);

    // Back to a chord step: the preview stops
    press(&mut synth, cc::STEP_MODE);
    step(&mut synth);
    assert_eq!(synth.pool().gated_count(), 0);
}

#[test]
fn test_edit_keeps_pause_state() {
    let mut synth = synth::<4>();
    press(&mut synth, cc::PAUSE);
    press(&mut synth, cc::EDIT);
    press(&mut synth, cc::EDIT);
    assert!(synth.sequencer().is_paused());
}

#[test]
fn test_edit_buttons_ignored_outside_edit_mode() {
    let mut synth = synth::<4>();
    assert!(!press(&mut synth, cc::REST));
    assert!(!press(&mut synth, cc::STEP_MODE));
    assert!(synth.sequencer().steps().iter().all(|s| s.notes.is_empty()));
}

#[test]
fn test_step_add_delete() {
    let mut synth = synth::<4>();
    synth.handle_event(InputEvent::control(cc::STEP_ADD_DELETE, 65));
    assert_eq!(synth.sequencer().len(), 5);
    synth.handle_event(InputEvent::control(cc::STEP_ADD_DELETE, 63));
    synth.handle_event(InputEvent::control(cc::STEP_ADD_DELETE, 63));
    assert_eq!(synth.sequencer().len(), 3);
}

#[test]
fn test_status_display() {
    let mut synth = synth::<4>();
    press(&mut synth, cc::MODE);
    select_arp_mode(&mut synth, ArpMode::PingPong);
    press(&mut synth, cc::PAUSE);

    let mut screen = TextBuffer::default();
    synth.redraw(&mut screen);
    assert_eq!(screen.line(0), "arp pingpong");
    assert_eq!(screen.line(1), "blep saw 1/4 ||");
}

#[test]
fn test_render_level_tracks_voices() {
    let mut synth = synth::<4>();
    keys_down(&mut synth, &[60]);

    let mut block = [0.0; BLOCK];
    synth.render_block(&mut block);
    assert!(block.iter().all(|s| (*s - 0.25).abs() < 1e-12));

    keys_up(&mut synth, &[60]);
    synth.render_block(&mut block);
    assert!(block.iter().all(|s| *s == 0.0));
}
