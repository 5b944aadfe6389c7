//! The capability the note-control core needs from a sound-generating voice.

use crate::config::{Patch, VoiceParams};

/// One sound-generating unit capable of sounding a single pitch.
///
/// The voice pool only starts, releases and renders voices; everything about
/// how a sample is produced lives behind this trait. Implementations must be
/// allocation-free in [`Voice::render_sample`], which runs in the real-time
/// context.
///
/// # Examples
///
/// ```
/// use polyarp::music::Voice;
/// use polyarp::{Patch, VoiceParams};
///
/// /// A voice that outputs its gate as a DC level.
/// #[derive(Default)]
/// struct GateProbe {
///     gate: bool,
/// }
///
/// impl Voice for GateProbe {
///     fn configure(&mut self, _patch: &Patch) {}
///     fn note_on(&mut self, _pitch: u8, _velocity: u8) {
///         self.gate = true;
///     }
///     fn retrigger(&mut self) {}
///     fn note_off(&mut self) {
///         self.gate = false;
///     }
///     fn is_active(&self) -> bool {
///         self.gate
///     }
///     fn render_sample(&mut self, _params: &VoiceParams) -> f64 {
///         if self.gate { 1.0 } else { 0.0 }
///     }
/// }
///
/// let mut probe = GateProbe::default();
/// probe.note_on(60, 100);
/// assert_eq!(probe.render_sample(&VoiceParams::default()), 1.0);
/// ```
pub trait Voice {
    /// Applies a new patch (wave shape, detune, envelope times).
    fn configure(&mut self, patch: &Patch);

    /// Starts sounding `pitch` at `velocity` (both 0-127).
    ///
    /// Calling this while the voice is already gated is a legato change: the
    /// pitch and level follow, the envelopes do not restart.
    fn note_on(&mut self, pitch: u8, velocity: u8);

    /// Restarts the envelopes from their attack phase.
    fn retrigger(&mut self);

    /// Enters the release phase.
    fn note_off(&mut self);

    /// Returns `true` until the release phase has completely finished.
    fn is_active(&self) -> bool;

    /// Produces the next output sample.
    fn render_sample(&mut self, params: &VoiceParams) -> f64;
}
