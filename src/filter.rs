//! Biquad filters: cascaded Direct-Form-II-Transposed Butterworth sections,
//! plus a single Audio-EQ-Cookbook high-shelf biquad.
//!
//! All four variants are built at construction time from `order`,
//! `sample_rate` and frequency parameters, then run one sample at a
//! time with `filter()`. There is no buffering beyond the IIR state
//! carried between calls.

use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, Default)]
struct Section {
    a: f32,
    d1: f32,
    d2: f32,
    w1: f32,
    w2: f32,
}

/// Second-order-section Butterworth low-pass, `order / 2` cascaded stages.
#[derive(Clone, Debug, Default)]
pub struct LowPass {
    stages: Vec<Section>,
}

impl LowPass {
    /// `order` must be even and positive; `cutoff` and `sample_rate` in Hz.
    pub fn new(order: usize, cutoff: f32, sample_rate: f32) -> Self {
        let n = order / 2;
        let a = (PI * cutoff / sample_rate).tan();
        let a2 = a * a;
        let stages = (0..n)
            .map(|i| {
                let r = (PI * (2.0 * i as f32 + 1.0) / (4.0 * n as f32)).sin();
                let s = a2 + 2.0 * r * a + 1.0;
                Section {
                    a: a2 / s,
                    d1: 2.0 * (1.0 - a2) / s,
                    d2: -(a2 - 2.0 * r * a + 1.0) / s,
                    w1: 0.0,
                    w2: 0.0,
                }
            })
            .collect();
        Self { stages }
    }

    pub fn filter(&mut self, sample: f32) -> f32 {
        let mut sample = sample;
        for s in &mut self.stages {
            let w0 = s.d1 * s.w1 + s.d2 * s.w2 + sample;
            sample = s.a * (w0 + 2.0 * s.w1 + s.w2);
            s.w2 = s.w1;
            s.w1 = w0;
        }
        sample
    }
}

/// Second-order-section Butterworth high-pass, `order / 2` cascaded stages.
#[derive(Clone, Debug, Default)]
pub struct HighPass {
    stages: Vec<Section>,
}

impl HighPass {
    pub fn new(order: usize, cutoff: f32, sample_rate: f32) -> Self {
        let n = order / 2;
        let a = (PI * cutoff / sample_rate).tan();
        let a2 = a * a;
        let stages = (0..n)
            .map(|i| {
                let r = (PI * (2.0 * i as f32 + 1.0) / (4.0 * n as f32)).sin();
                let s = a2 + 2.0 * r * a + 1.0;
                Section {
                    a: 1.0 / s,
                    d1: 2.0 * (1.0 - a2) / s,
                    d2: -(a2 - 2.0 * r * a + 1.0) / s,
                    w1: 0.0,
                    w2: 0.0,
                }
            })
            .collect();
        Self { stages }
    }

    pub fn filter(&mut self, sample: f32) -> f32 {
        let mut sample = sample;
        for s in &mut self.stages {
            let w0 = s.d1 * s.w1 + s.d2 * s.w2 + sample;
            sample = s.a * (w0 - 2.0 * s.w1 + s.w2);
            s.w2 = s.w1;
            s.w1 = w0;
        }
        sample
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FourthOrderSection {
    a: f32,
    d1: f32,
    d2: f32,
    d3: f32,
    d4: f32,
    w1: f32,
    w2: f32,
    w3: f32,
    w4: f32,
}

/// Butterworth band-pass, `order / 4` cascaded fourth-order sections.
#[derive(Clone, Debug, Default)]
pub struct BandPass {
    stages: Vec<FourthOrderSection>,
}

impl BandPass {
    pub fn new(order: usize, low_cutoff: f32, high_cutoff: f32, sample_rate: f32) -> Self {
        let n = order / 4;
        let a = (PI * (high_cutoff + low_cutoff) / sample_rate).cos()
            / (PI * (high_cutoff - low_cutoff) / sample_rate).cos();
        let b = (PI * (high_cutoff - low_cutoff) / sample_rate).tan();
        let a2 = a * a;
        let b2 = b * b;
        let stages = (0..n)
            .map(|i| {
                let r = (PI * (2.0 * i as f32 + 1.0) / (4.0 * n as f32)).sin();
                let s = b2 + 2.0 * r * b + 1.0;
                FourthOrderSection {
                    a: b2 / s,
                    d1: 4.0 * a * (1.0 + b * r) / s,
                    d2: 2.0 * (b2 - 2.0 * a2 - 1.0) / s,
                    d3: 4.0 * a * (1.0 - b * r) / s,
                    d4: -(b2 - 2.0 * r * b + 1.0) / s,
                    w1: 0.0,
                    w2: 0.0,
                    w3: 0.0,
                    w4: 0.0,
                }
            })
            .collect();
        Self { stages }
    }

    pub fn filter(&mut self, sample: f32) -> f32 {
        let mut sample = sample;
        for s in &mut self.stages {
            let w0 = s.d1 * s.w1 + s.d2 * s.w2 + s.d3 * s.w3 + s.d4 * s.w4 + sample;
            sample = s.a * (w0 - 2.0 * s.w2 + s.w4);
            s.w4 = s.w3;
            s.w3 = s.w2;
            s.w2 = s.w1;
            s.w1 = w0;
        }
        sample
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ShelfStage {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    w1: f32,
    w2: f32,
}

/// Audio-EQ-Cookbook high shelf, `S = 1` (Butterworth-shaped shelf),
/// `order / 2` cascaded biquad stages each applying the same shelf gain.
#[derive(Clone, Debug, Default)]
pub struct HighShelf {
    stages: Vec<ShelfStage>,
}

impl HighShelf {
    pub fn new(order: usize, cutoff: f32, sample_rate: f32, gain_db: f32) -> Self {
        let n = order / 2;
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let cosw0 = w0.cos();
        let sinw0 = w0.sin();
        let amp = 10f32.powf(gain_db / 40.0);
        let alpha = sinw0 / 2.0 * 2f32.sqrt();
        let stages = (0..n)
            .map(|_| {
                let b0 = amp * ((amp + 1.0) + (amp - 1.0) * cosw0 + 2.0 * amp.sqrt() * alpha);
                let b1 = -2.0 * amp * ((amp - 1.0) + (amp + 1.0) * cosw0);
                let b2 = amp * ((amp + 1.0) + (amp - 1.0) * cosw0 - 2.0 * amp.sqrt() * alpha);
                let a0 = (amp + 1.0) - (amp - 1.0) * cosw0 + 2.0 * amp.sqrt() * alpha;
                let a1 = 2.0 * ((amp - 1.0) - (amp + 1.0) * cosw0);
                let a2 = (amp + 1.0) - (amp - 1.0) * cosw0 - 2.0 * amp.sqrt() * alpha;
                ShelfStage {
                    b0: b0 / a0,
                    b1: b1 / a0,
                    b2: b2 / a0,
                    a1: a1 / a0,
                    a2: a2 / a0,
                    w1: 0.0,
                    w2: 0.0,
                }
            })
            .collect();
        Self { stages }
    }

    /// Direct Form II Transposed.
    pub fn filter(&mut self, sample: f32) -> f32 {
        let mut sample = sample;
        for s in &mut self.stages {
            let w0 = sample - s.a1 * s.w1 - s.a2 * s.w2;
            sample = s.b0 * w0 + s.b1 * s.w1 + s.b2 * s.w2;
            s.w2 = s.w1;
            s.w1 = w0;
        }
        sample
    }
}
