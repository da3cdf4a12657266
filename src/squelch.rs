//! Adaptive squelch gate: tracks a low/high envelope estimate and
//! reports whether the current sample falls below the noise floor.
//!
//! Not part of the DSP pipeline proper; a host may use this ahead of
//! the demodulator bank to skip processing during silence.

use crate::dynamics::Agc;
use crate::filter::LowPass;

fn coefficient(time_ms: f32, sample_rate: f32) -> f32 {
    1.0 - (-1000.0 / (time_ms * sample_rate)).exp()
}

/// Adaptive envelope-threshold squelch.
pub struct Squelch {
    lpf: LowPass,
    agc: Agc,
    low_ema: f32,
    high_ema: f32,
    threshold: f32,
    alpha: f32,
}

impl Squelch {
    pub fn new(initial_threshold: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        Self {
            lpf: LowPass::new(8, 500.0, sample_rate),
            agc: Agc::new(10.0, 10.0, sample_rate),
            low_ema: initial_threshold * 0.25,
            high_ema: initial_threshold * 1.5,
            threshold: initial_threshold,
            alpha: coefficient(time_constant_ms, sample_rate),
        }
    }

    /// Process one sample. Returns `true` when the tracked envelope is
    /// below the adaptive threshold (squelch engaged, signal is noise).
    pub fn process(&mut self, sample: f32) -> bool {
        let filtered = self.lpf.filter(sample);
        self.agc.filter(filtered);
        let envelope = self.agc.envelope();

        if envelope <= 1e-3 {
            return false;
        }

        if envelope < self.threshold {
            self.low_ema = self.alpha * envelope + (1.0 - self.alpha) * self.low_ema;
        } else {
            self.high_ema = self.alpha * envelope + (1.0 - self.alpha) * self.high_ema;
        }

        self.threshold = (self.low_ema + self.high_ema) * 0.5 * 1.250;

        envelope < self.threshold
    }

    pub fn envelope(&self) -> f32 {
        self.agc.envelope()
    }
}
