//! Periodic edge-triggered clock for the arpeggiator and sequencer.
//!
//! The render context advances the clock by whole blocks of samples; the
//! control context consumes the latched tick. Keeping the two halves apart
//! (`advance` vs `take_due`) is what lets a tick survive variable block sizes
//! without ever being double-consumed.

/// A sample-counting periodic timer with a latched "due" flag.
///
/// The clock uses a fractional accumulator so long runs do not drift. When a
/// period elapses, `due` is set and stays set until [`Clock::take_due`]
/// consumes it. Several periods elapsing before consumption coalesce into a
/// single pending tick.
///
/// # Examples
///
/// ```
/// use polyarp::music::Clock;
///
/// // 8 ticks per second at 48 kHz
/// let mut clock = Clock::new(0.125, 48_000);
///
/// let mut ticks = 0;
/// for _ in 0..(48_000 / 64) {
///     clock.advance(64);
///     if clock.take_due() {
///         ticks += 1;
///     }
/// }
/// assert_eq!(ticks, 8);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    sample_rate: u32,
    /// Period length in samples (fractional)
    period_samples: f64,
    /// Samples elapsed in the current period
    phase: f64,
    due: bool,
}

/// Shortest accepted period, in seconds.
pub const MIN_PERIOD: f64 = 0.000_5;

impl Clock {
    /// Creates a clock ticking every `period` seconds.
    ///
    /// Non-positive or non-finite periods fall back to [`MIN_PERIOD`]; a zero
    /// sample rate is treated as 1 Hz so the clock stays well-defined.
    pub fn new(period: f64, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        let mut clock = Self {
            sample_rate,
            period_samples: (MIN_PERIOD * f64::from(sample_rate)).max(1.0),
            phase: 0.0,
            due: false,
        };
        clock.set_period(period);
        clock
    }

    /// Sets the period in seconds. Returns `false` (and keeps the old period)
    /// when the value is not a positive finite number.
    pub fn set_period(&mut self, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds <= 0.0 {
            log::warn!("ignoring clock period of {} s", seconds);
            return false;
        }
        let seconds = seconds.max(MIN_PERIOD);
        self.period_samples = (seconds * f64::from(self.sample_rate)).max(1.0);
        true
    }

    /// Sets the tick rate in Hz (period = 1 / hz).
    pub fn set_frequency(&mut self, hz: f64) -> bool {
        if !hz.is_finite() || hz <= 0.0 {
            log::warn!("ignoring clock frequency of {} Hz", hz);
            return false;
        }
        self.set_period(1.0 / hz)
    }

    /// Returns the period in seconds.
    pub fn period(&self) -> f64 {
        self.period_samples / f64::from(self.sample_rate)
    }

    /// Returns the sample rate the clock counts in.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Advances the clock by `samples` samples, latching `due` on every
    /// period boundary crossed.
    ///
    /// Runs in constant time regardless of how many periods elapse.
    pub fn advance(&mut self, samples: usize) {
        self.phase += samples as f64;
        if self.phase >= self.period_samples {
            self.phase %= self.period_samples;
            self.due = true;
        }
    }

    /// Returns whether a tick is pending without consuming it.
    pub fn is_due(&self) -> bool {
        self.due
    }

    /// Consumes the pending tick, if any.
    pub fn take_due(&mut self) -> bool {
        std::mem::take(&mut self.due)
    }

    /// Restarts the current period from zero and drops any pending tick.
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
        self.due = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    #[test]
    fn test_creation() {
        let clock = Clock::new(0.5, SAMPLE_RATE);
        assert!(!clock.is_due());
        assert!((clock.period() - 0.5).abs() < 1e-9);
        assert_eq!(clock.sample_rate(), SAMPLE_RATE);
    }

    #[test]
    fn test_tick_reaches_boundary() {
        // 0.125 s at 44.1 kHz = 5512.5 samples per tick
        let mut clock = Clock::new(0.125, SAMPLE_RATE);

        let mut samples = 0;
        while !clock.is_due() {
            clock.advance(1);
            samples += 1;
        }

        assert_eq!(samples, 5513);
        assert!(clock.take_due());
        assert!(!clock.is_due());
    }

    #[test]
    fn test_no_drift_over_long_period() {
        let mut clock = Clock::new(0.125, SAMPLE_RATE);

        let mut ticks = 0;
        for _ in 0..(SAMPLE_RATE * 10) {
            clock.advance(1);
            if clock.take_due() {
                ticks += 1;
            }
        }

        assert_eq!(ticks, 80);
    }

    #[test]
    fn test_due_latched_until_consumed() {
        let mut clock = Clock::new(0.01, 1000);

        clock.advance(10);
        assert!(clock.is_due());

        // Nobody consumed it; it stays latched through further blocks
        clock.advance(3);
        assert!(clock.is_due());

        assert!(clock.take_due());
        assert!(!clock.take_due());
    }

    #[test]
    fn test_variable_block_sizes_do_not_drop_ticks() {
        let mut clock = Clock::new(0.01, 1000); // every 10 samples

        let mut ticks = 0;
        for block in [3usize, 7, 1, 9, 4, 6, 10, 2, 8].iter().cycle().take(90) {
            clock.advance(*block);
            if clock.take_due() {
                ticks += 1;
            }
        }

        // 90 blocks averaging 50/9 samples = 500 samples = 50 ticks,
        // minus any that coalesced inside a single block (none do here).
        assert_eq!(ticks, 50);
    }

    #[test]
    fn test_multiple_periods_in_one_block_coalesce() {
        let mut clock = Clock::new(0.01, 1000);

        clock.advance(35);
        assert!(clock.take_due());
        assert!(!clock.take_due());

        // Phase keeps the remainder: 5 more samples complete the next period
        clock.advance(5);
        assert!(clock.take_due());
    }

    #[test]
    fn test_reset_phase_discards_pending() {
        let mut clock = Clock::new(0.01, 1000);

        clock.advance(15);
        clock.reset_phase();
        assert!(!clock.is_due());

        clock.advance(9);
        assert!(!clock.is_due());
        clock.advance(1);
        assert!(clock.is_due());
    }

    #[test]
    fn test_invalid_period_is_ignored() {
        let mut clock = Clock::new(0.25, SAMPLE_RATE);

        assert!(!clock.set_period(0.0));
        assert!(!clock.set_period(-1.0));
        assert!(!clock.set_period(f64::NAN));
        assert!((clock.period() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_set_frequency() {
        let mut clock = Clock::new(1.0, SAMPLE_RATE);

        assert!(clock.set_frequency(4.0));
        assert!((clock.period() - 0.25).abs() < 1e-9);
        assert!(!clock.set_frequency(0.0));
    }
}
