//! ADSR envelope generator.

use crate::config::EnvelopeSettings;

/// Trait for envelope generators with a note lifecycle.
pub trait Envelope {
    /// Starts the attack phase from the current level.
    fn trigger(&mut self);

    /// Starts the release phase. Has no effect while idle.
    fn release(&mut self);

    /// Returns true from trigger until the release phase completes.
    fn is_active(&self) -> bool;

    /// Generates the next envelope value in 0.0..=1.0.
    fn next_sample(&mut self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear ADSR envelope.
///
/// Re-triggering an active envelope restarts the attack from the current
/// level rather than from zero, so retriggered notes do not click.
///
/// # Examples
///
/// ```
/// use polyarp::EnvelopeSettings;
/// use polyarp::synthesis::{Adsr, Envelope};
///
/// let mut env = Adsr::new(EnvelopeSettings::new(0.01, 0.1, 0.7, 0.3), 44_100);
///
/// env.trigger();
/// for _ in 0..10_000 {
///     env.next_sample();
/// }
/// assert!((env.level() - 0.7).abs() < 1e-9);
///
/// env.release();
/// while env.is_active() {
///     env.next_sample();
/// }
/// assert_eq!(env.level(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Adsr {
    stage: Stage,
    /// Samples elapsed in the current stage
    position: f64,
    level: f64,
    /// Level the current attack or release started from
    start_level: f64,
    settings: EnvelopeSettings,
    sample_rate: f64,
}

impl Adsr {
    pub fn new(settings: EnvelopeSettings, sample_rate: u32) -> Self {
        Self {
            stage: Stage::Idle,
            position: 0.0,
            level: 0.0,
            start_level: 0.0,
            settings,
            sample_rate: f64::from(sample_rate.max(1)),
        }
    }

    /// Replaces the stage times and sustain level. A stage in progress
    /// continues with the new length.
    pub fn set(&mut self, settings: &EnvelopeSettings) {
        self.settings = *settings;
    }

    pub fn settings(&self) -> &EnvelopeSettings {
        &self.settings
    }

    /// The last generated value.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Returns to idle at zero immediately.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.position = 0.0;
        self.level = 0.0;
        self.start_level = 0.0;
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.position = 0.0;
        self.start_level = self.level;
    }

    /// Progress through a stage of `seconds`, or `None` once it is over.
    fn progress(&mut self, seconds: f64) -> Option<f64> {
        let length = seconds * self.sample_rate;
        if self.position >= length {
            return None;
        }
        let progress = self.position / length;
        self.position += 1.0;
        Some(progress)
    }
}

impl Envelope for Adsr {
    fn trigger(&mut self) {
        self.enter(Stage::Attack);
    }

    fn release(&mut self) {
        if self.stage != Stage::Idle {
            self.enter(Stage::Release);
        }
    }

    fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    fn next_sample(&mut self) -> f64 {
        let sustain = self.settings.sustain;
        match self.stage {
            Stage::Idle => {}
            Stage::Attack => match self.progress(self.settings.attack) {
                Some(p) => self.level = self.start_level + (1.0 - self.start_level) * p,
                None => {
                    self.level = 1.0;
                    self.enter(Stage::Decay);
                }
            },
            Stage::Decay => match self.progress(self.settings.decay) {
                Some(p) => self.level = 1.0 - (1.0 - sustain) * p,
                None => {
                    self.level = sustain;
                    self.enter(Stage::Sustain);
                }
            },
            Stage::Sustain => self.level = sustain,
            Stage::Release => match self.progress(self.settings.release) {
                Some(p) => self.level = self.start_level * (1.0 - p),
                None => {
                    self.level = 0.0;
                    self.enter(Stage::Idle);
                }
            },
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 100;
    const EPSILON: f64 = 1e-9;

    fn env(attack: f64, decay: f64, sustain: f64, release: f64) -> Adsr {
        Adsr::new(
            EnvelopeSettings::new(attack, decay, sustain, release),
            SAMPLE_RATE,
        )
    }

    #[test]
    fn test_idle_outputs_zero() {
        let mut env = env(0.1, 0.1, 0.5, 0.1);
        assert!(!env.is_active());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn test_attack_is_linear() {
        // 1 s attack at 100 Hz = 100 samples
        let mut env = env(1.0, 0.0, 1.0, 0.0);
        env.trigger();

        assert!(env.next_sample().abs() < EPSILON);
        for _ in 0..49 {
            env.next_sample();
        }
        assert!((env.next_sample() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_reaches_sustain() {
        let mut env = env(0.1, 0.1, 0.6, 0.1);
        env.trigger();
        for _ in 0..30 {
            env.next_sample();
        }
        assert!((env.level() - 0.6).abs() < EPSILON);
        assert!(env.is_active());
    }

    #[test]
    fn test_release_goes_idle() {
        let mut env = env(0.0, 0.0, 0.8, 0.1);
        env.trigger();
        for _ in 0..5 {
            env.next_sample();
        }

        env.release();
        let first = env.next_sample();
        assert!((first - 0.8).abs() < EPSILON);

        let mut samples = 1;
        while env.is_active() {
            env.next_sample();
            samples += 1;
        }
        assert_eq!(samples, 11);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn test_retrigger_starts_from_current_level() {
        let mut env = env(1.0, 0.0, 1.0, 1.0);
        env.trigger();
        for _ in 0..51 {
            env.next_sample();
        }
        let before = env.level();

        env.trigger();
        let after = env.next_sample();
        assert!((after - before).abs() < EPSILON);
    }

    #[test]
    fn test_release_while_idle_is_noop() {
        let mut env = env(0.1, 0.1, 0.5, 0.1);
        env.release();
        assert!(!env.is_active());
    }

    #[test]
    fn test_set_changes_sustain() {
        let mut env = env(0.0, 0.0, 0.5, 0.1);
        env.trigger();
        for _ in 0..3 {
            env.next_sample();
        }
        env.set(&EnvelopeSettings::new(0.0, 0.0, 0.25, 0.1));
        assert!((env.next_sample() - 0.25).abs() < EPSILON);
        assert_eq!(env.settings().sustain, 0.25);
    }
}
