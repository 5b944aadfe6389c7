use proc_macro::TokenStream;
use quote::quote;
use syn::{LitStr, parse_macro_input};

/// Resolves a note name to its MIDI pitch number at compile time.
///
/// The expansion is a plain `u8` literal, so it can be used anywhere a pitch
/// is expected, including `const` items and step programming in hot paths.
///
/// # Format
///
/// The format is: `<pitch>[octave]` where:
/// - `pitch` can be: C, D, E, F, G, A, B with optional # or b
/// - `octave` is optional, defaults to 4 (middle octave)
/// - When provided, octave must be -1 to 9
///
/// Names that land outside 0-127 (for example `"A9"`) are rejected with a
/// compile error instead of being clamped.
///
/// # Examples
///
/// ```ignore
/// use polyarp::note;
///
/// assert_eq!(note!("C4"), 60);
/// assert_eq!(note!("A"), 69);
/// assert_eq!(note!("Bb3"), 58);
/// ```
#[proc_macro]
pub fn note(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LitStr);
    let note_str = input.value();

    match parse_note(&note_str).and_then(|(pitch, octave)| pitch_to_midi(pitch, octave)) {
        Ok(midi_note) => {
            let expanded = quote! { #midi_note };
            TokenStream::from(expanded)
        }
        Err(e) => {
            let error_msg = format!("Invalid note string '{}': {}", note_str, e);
            let expanded = quote! {
                compile_error!(#error_msg)
            };
            TokenStream::from(expanded)
        }
    }
}

fn semitone(s: &str) -> Result<i16, String> {
    let s = s.to_uppercase();
    match s.as_str() {
        "C" | "B#" => Ok(0),
        "C#" | "DB" => Ok(1),
        "D" => Ok(2),
        "D#" | "EB" => Ok(3),
        "E" | "FB" => Ok(4),
        "F" | "E#" => Ok(5),
        "F#" | "GB" => Ok(6),
        "G" => Ok(7),
        "G#" | "AB" => Ok(8),
        "A" => Ok(9),
        "A#" | "BB" => Ok(10),
        "B" | "CB" => Ok(11),
        _ => Err(format!("invalid pitch '{}'", s)),
    }
}

fn parse_note(s: &str) -> Result<(i16, i16), String> {
    if s.is_empty() {
        return Err("empty string".to_string());
    }

    let octave_start = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(i, _)| i);

    let (pitch_str, octave) = match octave_start {
        Some(0) => {
            return Err("string starts with number".to_string());
        }
        Some(pos) => {
            let octave_str = &s[pos..];
            let octave = octave_str
                .parse::<i16>()
                .map_err(|_| format!("invalid octave '{}'", octave_str))?;

            if !(-1..=9).contains(&octave) {
                return Err(format!("octave {} out of range (-1 to 9)", octave));
            }

            (&s[..pos], octave)
        }
        None => (s, 4),
    };

    Ok((semitone(pitch_str)?, octave))
}

fn pitch_to_midi(semitone: i16, octave: i16) -> Result<u8, String> {
    let midi = (octave + 1) * 12 + semitone;
    u8::try_from(midi)
        .ok()
        .filter(|m| *m <= 127)
        .ok_or_else(|| format!("pitch {} is outside the MIDI range", midi))
}
