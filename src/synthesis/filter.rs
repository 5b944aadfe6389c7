//! Resonant low-pass filter.

use std::f64::consts::PI;

/// Lowest cutoff reachable from the normalized control range, in Hz.
pub const MIN_CUTOFF_HZ: f64 = 100.0;

/// Highest cutoff, in Hz, before the sample-rate limit applies.
pub const MAX_CUTOFF_HZ: f64 = 20_000.0;

/// Maps a normalized cutoff (0.0..=1.0) logarithmically onto
/// [`MIN_CUTOFF_HZ`] up to 20 kHz or a third of the sample rate, whichever
/// is lower.
///
/// # Examples
///
/// ```
/// use polyarp::synthesis::cutoff_hz;
///
/// assert!((cutoff_hz(0.0, 48_000) - 100.0).abs() < 1e-9);
/// assert!((cutoff_hz(1.0, 48_000) - 16_000.0).abs() < 1e-6);
/// ```
pub fn cutoff_hz(normalized: f64, sample_rate: u32) -> f64 {
    let top = MAX_CUTOFF_HZ.min(f64::from(sample_rate) / 3.0);
    let top = top.max(MIN_CUTOFF_HZ);
    MIN_CUTOFF_HZ * (top / MIN_CUTOFF_HZ).powf(normalized.clamp(0.0, 1.0))
}

/// Two-pole state-variable low-pass filter (trapezoidal integration).
///
/// Stable for any cutoff below Nyquist and resonance below 1.0.
#[derive(Debug, Clone)]
pub struct LowPass {
    sample_rate: f64,
    ic1eq: f64,
    ic2eq: f64,
    a1: f64,
    a2: f64,
    a3: f64,
}

impl LowPass {
    /// Highest accepted resonance; 1.0 would remove all damping.
    pub const MAX_RESONANCE: f64 = 0.995;

    pub fn new(sample_rate: u32) -> Self {
        let mut filter = Self {
            sample_rate: f64::from(sample_rate.max(1)),
            ic1eq: 0.0,
            ic2eq: 0.0,
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
        };
        filter.set(1_000.0, 0.0);
        filter
    }

    /// Sets cutoff (Hz) and resonance (0.0..1.0).
    pub fn set(&mut self, cutoff: f64, resonance: f64) {
        let cutoff = cutoff.clamp(1.0, self.sample_rate * 0.49);
        let g = (PI * cutoff / self.sample_rate).tan();
        let k = 2.0 - 2.0 * resonance.clamp(0.0, Self::MAX_RESONANCE);
        self.a1 = 1.0 / (1.0 + g * (g + k));
        self.a2 = g * self.a1;
        self.a3 = g * self.a2;
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let v3 = input - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        v2
    }

    /// Clears the filter memory.
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    const SAMPLE_RATE: u32 = 48_000;

    fn rms_through(filter: &mut LowPass, frequency: f64) -> f64 {
        let n = SAMPLE_RATE as usize / 2;
        let mut sum = 0.0;
        for i in 0..n {
            let x = (TAU * frequency * i as f64 / f64::from(SAMPLE_RATE)).sin();
            let y = filter.process(x);
            // Skip the settling time
            if i >= n / 2 {
                sum += y * y;
            }
        }
        (sum / (n / 2) as f64).sqrt()
    }

    #[test]
    fn test_cutoff_mapping() {
        assert!((cutoff_hz(0.5, 48_000) - 100.0 * 160.0_f64.sqrt()).abs() < 1e-6);
        // 20 kHz cap at high sample rates
        assert!((cutoff_hz(1.0, 96_000) - 20_000.0).abs() < 1e-6);
        // Out-of-range input is clamped
        assert_eq!(cutoff_hz(-1.0, 48_000), cutoff_hz(0.0, 48_000));
    }

    #[test]
    fn test_passes_low_frequencies() {
        let mut filter = LowPass::new(SAMPLE_RATE);
        filter.set(5_000.0, 0.0);
        let rms = rms_through(&mut filter, 100.0);
        assert!((rms - 0.5_f64.sqrt()).abs() < 0.05);
    }

    #[test]
    fn test_attenuates_high_frequencies() {
        let mut filter = LowPass::new(SAMPLE_RATE);
        filter.set(200.0, 0.0);
        let rms = rms_through(&mut filter, 8_000.0);
        assert!(rms < 0.01);
    }

    #[test]
    fn test_stable_at_max_resonance() {
        let mut filter = LowPass::new(SAMPLE_RATE);
        filter.set(1_000.0, 1.0);
        for i in 0..SAMPLE_RATE {
            let y = filter.process(if i % 100 < 50 { 1.0 } else { -1.0 });
            assert!(y.is_finite());
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = LowPass::new(SAMPLE_RATE);
        for _ in 0..100 {
            filter.process(1.0);
        }
        filter.reset();
        filter.set(1_000.0, 0.0);
        assert!(filter.process(0.0).abs() < 1e-12);
    }
}
