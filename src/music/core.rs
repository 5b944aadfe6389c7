//! Note-level vocabulary shared by the voice pool, arpeggiator and sequencer.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Highest valid MIDI pitch.
pub const MAX_PITCH: u8 = 127;

/// Pitch classes of the chromatic scale.
///
/// Use sharp notation (e.g., `FSharp` instead of G flat).
///
/// # Examples
///
/// ```
/// use polyarp::music::core::PitchClass;
///
/// assert_eq!(PitchClass::C.to_midi_note(4), Some(60));
/// assert_eq!(PitchClass::A.to_midi_note(4), Some(69));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Returns the semitone offset from C (0-11).
    pub fn semitone_offset(&self) -> u8 {
        *self as u8
    }

    /// Returns the pitch class of a MIDI pitch.
    pub fn of(pitch: u8) -> Self {
        Self::ALL[(pitch % 12) as usize]
    }

    /// Combines the pitch class with an octave into a MIDI pitch.
    ///
    /// MIDI pitch numbers range from 0-127, where C-1 = 0, C4 = 60, A4 = 69
    /// and G9 = 127. Returns `None` outside that range.
    pub fn to_midi_note(&self, octave: i8) -> Option<u8> {
        let midi = (i16::from(octave) + 1) * 12 + i16::from(self.semitone_offset());
        u8::try_from(midi).ok().filter(|m| *m <= MAX_PITCH)
    }

    fn symbol(&self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }
}

impl FromStr for PitchClass {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_uppercase();

        match s.as_str() {
            "C" | "B#" => Ok(PitchClass::C),
            "C#" | "DB" => Ok(PitchClass::CSharp),
            "D" => Ok(PitchClass::D),
            "D#" | "EB" => Ok(PitchClass::DSharp),
            "E" | "FB" => Ok(PitchClass::E),
            "F" | "E#" => Ok(PitchClass::F),
            "F#" | "GB" => Ok(PitchClass::FSharp),
            "G" => Ok(PitchClass::G),
            "G#" | "AB" => Ok(PitchClass::GSharp),
            "A" => Ok(PitchClass::A),
            "A#" | "BB" => Ok(PitchClass::ASharp),
            "B" | "CB" => Ok(PitchClass::B),
            _ => Err(ParseError::InvalidPitch(s)),
        }
    }
}

/// Parses a note name into a MIDI pitch.
///
/// The format is `<pitch>[octave]`; the octave defaults to 4 and must lie in
/// -1..=9 when given.
///
/// # Examples
///
/// ```
/// use polyarp::music::core::parse_note;
///
/// assert_eq!(parse_note("C4"), Ok(60));
/// assert_eq!(parse_note("Bb3"), Ok(58));
/// assert!(parse_note("H2").is_err());
/// ```
pub fn parse_note(s: &str) -> Result<u8, ParseError> {
    if s.is_empty() {
        return Err(ParseError::Empty);
    }

    let octave_start = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(i, _)| i);

    let (pitch_str, octave) = match octave_start {
        Some(0) => return Err(ParseError::InvalidPitch(String::new())),
        Some(pos) => {
            let octave_str = &s[pos..];
            let octave = octave_str
                .parse::<i8>()
                .map_err(|_| ParseError::InvalidOctave(octave_str.to_string()))?;

            if !(-1..=9).contains(&octave) {
                return Err(ParseError::InvalidOctave(octave_str.to_string()));
            }

            (&s[..pos], octave)
        }
        None => (s, 4),
    };

    let class: PitchClass = pitch_str.parse()?;
    class.to_midi_note(octave).ok_or(ParseError::OutOfRange(
        (i16::from(octave) + 1) * 12 + i16::from(class.semitone_offset()),
    ))
}

/// Converts a MIDI pitch to frequency in Hz (A4 = 69 = 440 Hz).
pub fn midi_to_freq(pitch: u8) -> f64 {
    440.0 * 2.0_f64.powf((f64::from(pitch) - 69.0) / 12.0)
}

/// Display adapter printing a MIDI pitch as a note name, e.g. `C#4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteName(pub u8);

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let octave = i16::from(self.0 / 12) - 1;
        write!(f, "{}{}", PitchClass::of(self.0).symbol(), octave)
    }
}

/// A decoded note, as delivered by the MIDI layer.
///
/// Matching against voices and held notes is by pitch only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteEvent {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
}

impl NoteEvent {
    /// Creates a note event, clamping pitch and velocity into 0-127.
    pub fn new(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self {
            channel,
            pitch: pitch.min(MAX_PITCH),
            velocity: velocity.min(MAX_PITCH),
        }
    }
}

/// One entry of a note list: either a note or a rest.
///
/// Steps and the arpeggiator's working list hold slots; a rest takes its turn
/// in the pattern but sounds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Slot {
    Note(NoteEvent),
    Rest,
}

impl Slot {
    pub fn pitch(&self) -> Option<u8> {
        match self {
            Slot::Note(n) => Some(n.pitch),
            Slot::Rest => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Slot::Rest)
    }

    /// Sort key placing rests above every pitch.
    pub(crate) fn sort_key(&self) -> u16 {
        self.pitch().map_or(u16::from(MAX_PITCH) + 1, u16::from)
    }
}

impl From<NoteEvent> for Slot {
    fn from(note: NoteEvent) -> Self {
        Slot::Note(note)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Note(n) => NoteName(n.pitch).fmt(f),
            Slot::Rest => write!(f, "--"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_offsets() {
        assert_eq!(PitchClass::C.semitone_offset(), 0);
        assert_eq!(PitchClass::CSharp.semitone_offset(), 1);
        assert_eq!(PitchClass::A.semitone_offset(), 9);
        assert_eq!(PitchClass::of(61), PitchClass::CSharp);
    }

    #[test]
    fn test_parse_note() {
        assert_eq!(parse_note("C4"), Ok(60));
        assert_eq!(parse_note("C"), Ok(60));
        assert_eq!(parse_note("a4"), Ok(69));
        assert_eq!(parse_note("C-1"), Ok(0));
        assert_eq!(parse_note("G9"), Ok(127));
    }

    #[test]
    fn test_parse_note_errors() {
        assert_eq!(parse_note(""), Err(ParseError::Empty));
        assert!(matches!(parse_note("4"), Err(ParseError::InvalidPitch(_))));
        assert!(matches!(parse_note("H4"), Err(ParseError::InvalidPitch(_))));
        assert!(matches!(
            parse_note("C10"),
            Err(ParseError::InvalidOctave(_))
        ));
        assert_eq!(parse_note("A9"), Err(ParseError::OutOfRange(129)));
    }

    #[test]
    fn test_note_name_display() {
        assert_eq!(NoteName(60).to_string(), "C4");
        assert_eq!(NoteName(61).to_string(), "C#4");
        assert_eq!(NoteName(0).to_string(), "C-1");
        assert_eq!(Slot::Rest.to_string(), "--");
    }

    #[test]
    fn test_midi_to_freq() {
        assert!((midi_to_freq(69) - 440.0).abs() < 0.01);
        assert!((midi_to_freq(60) - 261.63).abs() < 0.01);
    }

    #[test]
    fn test_note_event_clamps() {
        let e = NoteEvent::new(0, 200, 255);
        assert_eq!(e.pitch, 127);
        assert_eq!(e.velocity, 127);
    }

    #[test]
    fn test_rest_sorts_above_pitches() {
        let high = Slot::Note(NoteEvent::new(0, 127, 100));
        assert!(Slot::Rest.sort_key() > high.sort_key());
        assert_eq!(Slot::Rest.pitch(), None);
    }
}
