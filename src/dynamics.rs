//! Automatic gain control: a single-envelope (one-sided) tracker for
//! per-branch demodulator normalization, and a two-envelope
//! (upper/lower) tracker used where the signal isn't known to be
//! zero-centered.

const MIN_ENVELOPE: f32 = 1e-3;

fn coefficient(time_ms: f32, sample_rate: f32) -> f32 {
    1.0 - (-1000.0 / (time_ms * sample_rate)).exp()
}

/// Tracks `|sample|` with independent attack/release time constants and
/// normalizes by the envelope. Output is unbounded (roughly `[-1, 1]`
/// once the envelope has settled).
#[derive(Clone, Copy, Debug)]
pub struct Agc {
    attack: f32,
    release: f32,
    envelope: f32,
}

impl Agc {
    pub fn new(attack_ms: f32, release_ms: f32, sample_rate: f32) -> Self {
        Self {
            attack: coefficient(attack_ms, sample_rate),
            release: coefficient(release_ms, sample_rate),
            envelope: 1.0,
        }
    }

    pub fn filter(&mut self, sample: f32) -> f32 {
        let abs_sample = sample.abs();
        if abs_sample > self.envelope {
            self.envelope += self.attack * (abs_sample - self.envelope);
        } else {
            self.envelope += self.release * (abs_sample - self.envelope);
        }
        if self.envelope < MIN_ENVELOPE {
            self.envelope = MIN_ENVELOPE;
        }
        sample / self.envelope
    }

    pub fn envelope(&self) -> f32 {
        self.envelope
    }
}

/// Tracks an upper envelope from positive excursions and a lower
/// envelope from negative excursions independently, normalizing the
/// output to roughly `[-1, 1]`.
#[derive(Clone, Copy, Debug)]
pub struct TwoSidedAgc {
    attack: f32,
    release: f32,
    lower: f32,
    upper: f32,
}

impl TwoSidedAgc {
    pub fn new(attack_ms: f32, release_ms: f32, sample_rate: f32) -> Self {
        Self {
            attack: coefficient(attack_ms, sample_rate),
            release: coefficient(release_ms, sample_rate),
            lower: -0.0,
            upper: 0.0,
        }
    }

    pub fn filter(&mut self, sample: f32) -> f32 {
        if sample > self.upper {
            self.upper += self.attack * (sample - self.upper);
        } else {
            self.upper += self.release * (sample - self.upper);
        }
        if sample < self.lower {
            self.lower += self.attack * (sample - self.lower);
        } else {
            self.lower += self.release * (sample - self.lower);
        }
        let envelope = (self.upper - self.lower).max(MIN_ENVELOPE);
        2.0 * (sample - self.lower) / envelope - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agc_normalizes_steady_tone() {
        let mut agc = Agc::new(1.0, 1.0, 8000.0);
        let mut last = 0.0;
        for i in 0..8000 {
            let x = 0.3 * (2.0 * std::f32::consts::PI * 400.0 * i as f32 / 8000.0).sin();
            last = agc.filter(x);
        }
        assert!(last.abs() <= 1.01, "expected near-unity output, got {last}");
    }

    #[test]
    fn agc_envelope_floor_avoids_division_blowup() {
        let mut agc = Agc::new(50.0, 50.0, 8000.0);
        for _ in 0..4000 {
            agc.filter(0.0);
        }
        assert!(agc.envelope() >= 1e-3);
        assert!(agc.filter(0.0).is_finite());
    }

    #[test]
    fn two_sided_agc_centers_asymmetric_signal() {
        let mut agc = TwoSidedAgc::new(1.0, 1.0, 8000.0);
        let mut out = 0.0;
        for i in 0..8000 {
            let x = 0.2 + 0.1 * (2.0 * std::f32::consts::PI * 400.0 * i as f32 / 8000.0).sin();
            out = agc.filter(x);
        }
        assert!(out.abs() <= 1.01);
    }
}
