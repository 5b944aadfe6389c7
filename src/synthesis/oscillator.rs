//! Multi-shape oscillator with band-limited variants.

use std::f64::consts::TAU;

use crate::config::WaveShape;

/// Leak applied to the integrated square of the band-limited triangle,
/// per unit of phase increment. Keeps DC from accumulating.
const TRIANGLE_LEAK: f64 = 0.05;

/// An oscillator producing any [`WaveShape`] in -1.0..=1.0.
///
/// The `PolyBlep*` shapes correct each discontinuity with a polynomial
/// band-limited step, which removes most audible aliasing at high pitches.
///
/// # Examples
///
/// ```
/// use polyarp::WaveShape;
/// use polyarp::synthesis::Oscillator;
///
/// let mut osc = Oscillator::new(WaveShape::Saw, 100);
/// osc.set_frequency(1.0);
///
/// // A rising saw starts at the bottom
/// assert_eq!(osc.next_sample(), -1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    shape: WaveShape,
    /// Current phase (0.0 to 1.0)
    phase: f64,
    /// Phase increment per sample (frequency / sample_rate)
    increment: f64,
    sample_rate: f64,
    /// Integrator state for the band-limited triangle
    integrator: f64,
}

impl Oscillator {
    pub fn new(shape: WaveShape, sample_rate: u32) -> Self {
        Self {
            shape,
            phase: 0.0,
            increment: 0.0,
            sample_rate: f64::from(sample_rate.max(1)),
            integrator: 0.0,
        }
    }

    pub fn shape(&self) -> WaveShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: WaveShape) {
        if shape != self.shape {
            self.shape = shape;
            self.integrator = 0.0;
        }
    }

    /// Sets the frequency in Hz, limited to below Nyquist.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.increment = (frequency / self.sample_rate).clamp(0.0, 0.5);
    }

    pub fn frequency(&self) -> f64 {
        self.increment * self.sample_rate
    }

    /// Restarts the waveform from phase zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.integrator = 0.0;
    }

    pub fn next_sample(&mut self) -> f64 {
        let t = self.phase;
        let dt = self.increment;

        let sample = match self.shape {
            WaveShape::Sine => (t * TAU).sin(),
            WaveShape::Triangle => 1.0 - 4.0 * (t - 0.5).abs(),
            WaveShape::Saw => 2.0 * t - 1.0,
            WaveShape::Ramp => 1.0 - 2.0 * t,
            WaveShape::Square => square(t),
            WaveShape::PolyBlepSaw => 2.0 * t - 1.0 - poly_blep(t, dt),
            WaveShape::PolyBlepSquare => blep_square(t, dt),
            WaveShape::PolyBlepTriangle => {
                // Integrated band-limited square
                self.integrator = self.integrator * (1.0 - TRIANGLE_LEAK * dt)
                    + 4.0 * dt * blep_square(t, dt);
                self.integrator.clamp(-1.0, 1.0)
            }
        };

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        sample
    }
}

fn square(t: f64) -> f64 {
    if t < 0.5 { 1.0 } else { -1.0 }
}

fn blep_square(t: f64, dt: f64) -> f64 {
    square(t) + poly_blep(t, dt) - poly_blep((t + 0.5) % 1.0, dt)
}

/// PolyBLEP correction around a unit discontinuity at phase 0.
///
/// `t` is the phase (0.0 to 1.0) and `dt` the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}
