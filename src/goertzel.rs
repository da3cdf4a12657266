//! Single-bin Goertzel power estimator over a sliding sample window.

use std::f32::consts::PI;

/// Estimates signal power at one target frequency within a fixed-size
/// sliding window. Each call needs both the newest sample and the
/// sample that is leaving the window (see [`crate::ring::RingHistory`]).
#[derive(Clone, Copy, Debug)]
pub struct Goertzel {
    window_size: f32,
    coeff: f32,
    q1: f32,
    q2: f32,
}

impl Goertzel {
    pub fn new(window_size: usize, frequency: f32, sample_rate: f32) -> Self {
        let wsize = window_size as f32;
        let bin = (0.5 + wsize * frequency / sample_rate) as i32;
        let omega = 2.0 * PI * bin as f32 / wsize;
        Self {
            window_size: wsize,
            coeff: 2.0 * omega.cos(),
            q1: 0.0,
            q2: 0.0,
        }
    }

    /// `newest` is the sample just inserted into the window; `oldest` is
    /// the sample that fell out of it.
    pub fn process(&mut self, newest: f32, oldest: f32) -> f32 {
        let q0 = newest - oldest + self.coeff * self.q1 - self.q2;
        self.q2 = self.q1;
        self.q1 = q0;
        (self.q1 * self.q1 + self.q2 * self.q2 - self.q1 * self.q2 * self.coeff)
            / (self.window_size / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responds_strongly_at_target_frequency() {
        let sample_rate = 8000.0;
        let window = 64;
        let mut grz = Goertzel::new(window, 1000.0, sample_rate);
        let mut ring = crate::ring::RingHistory::new(window);
        let mut power = 0.0;
        for i in 0..window * 4 {
            let x = (2.0 * PI * 1000.0 * i as f32 / sample_rate).sin();
            let oldest = ring.shift1(x);
            power = grz.process(x, oldest);
        }
        assert!(power > 0.3, "expected strong response, got {power}");
    }

    #[test]
    fn rejects_off_target_frequency() {
        let sample_rate = 8000.0;
        let window = 64;
        let mut grz = Goertzel::new(window, 1000.0, sample_rate);
        let mut ring = crate::ring::RingHistory::new(window);
        let mut power = 1.0;
        for i in 0..window * 4 {
            let x = (2.0 * PI * 3000.0 * i as f32 / sample_rate).sin();
            let oldest = ring.shift1(x);
            power = grz.process(x, oldest);
        }
        assert!(power < 0.3, "expected weak response, got {power}");
    }
}
