//! Per-sample demodulators: each converts one audio sample into one
//! real-valued soft symbol, roughly in `[-1, 1]`, positive meaning
//! mark and negative meaning space.

use num_complex::Complex32;

use crate::dynamics::Agc;
use crate::filter::LowPass;
use crate::goertzel::Goertzel;
use crate::ring::RingHistory;

/// Shared construction parameters for every demodulator variant.
#[derive(Clone, Copy, Debug)]
pub struct DemodParams {
    pub mark_freq: f32,
    pub space_freq: f32,
    pub baud_rate: f32,
    pub sample_rate: f32,
}

/// A single demodulated sample.
pub trait Demodulator {
    fn process(&mut self, sample: f32) -> f32;
}

struct GoertzelTuning {
    window_mul: f32,
    agc_attack_ms: f32,
    agc_release_ms: f32,
    sym_clip: f32,
    post_lpf_order: usize,
    post_lpf_cutoff_mul: f32,
}

const GOERTZEL_OPTIM: GoertzelTuning = GoertzelTuning {
    window_mul: 1.08,
    agc_attack_ms: 0.01,
    agc_release_ms: 83.45,
    sym_clip: 0.488,
    post_lpf_order: 6,
    post_lpf_cutoff_mul: 0.854,
};

const GOERTZEL_PESIM: GoertzelTuning = GoertzelTuning {
    window_mul: 1.05,
    agc_attack_ms: 0.02,
    agc_release_ms: 27.33,
    sym_clip: 0.894,
    post_lpf_order: 4,
    post_lpf_cutoff_mul: 1.200,
};

/// Goertzel-based demodulator; `optimistic`/`pessimistic` differ only
/// in their tuning constants.
pub struct GoertzelDemod {
    history: RingHistory,
    mark: Goertzel,
    space: Goertzel,
    mark_agc: Agc,
    space_agc: Agc,
    sym_clip: f32,
    post_lpf: LowPass,
}

impl GoertzelDemod {
    fn new(params: DemodParams, tuning: &GoertzelTuning) -> Self {
        let window_size =
            ((params.sample_rate / params.baud_rate) * tuning.window_mul).round() as usize;
        let window_size = window_size.max(1);
        Self {
            history: RingHistory::new(window_size),
            mark: Goertzel::new(window_size, params.mark_freq, params.sample_rate),
            space: Goertzel::new(window_size, params.space_freq, params.sample_rate),
            mark_agc: Agc::new(tuning.agc_attack_ms, tuning.agc_release_ms, params.sample_rate),
            space_agc: Agc::new(tuning.agc_attack_ms, tuning.agc_release_ms, params.sample_rate),
            sym_clip: tuning.sym_clip,
            post_lpf: LowPass::new(
                tuning.post_lpf_order,
                tuning.post_lpf_cutoff_mul * params.baud_rate,
                params.sample_rate,
            ),
        }
    }

    pub fn optimistic(params: DemodParams) -> Self {
        Self::new(params, &GOERTZEL_OPTIM)
    }

    pub fn pessimistic(params: DemodParams) -> Self {
        Self::new(params, &GOERTZEL_PESIM)
    }
}

impl Demodulator for GoertzelDemod {
    fn process(&mut self, sample: f32) -> f32 {
        let oldest = self.history.shift1(sample);
        let mark_power = self.mark.process(sample, oldest);
        let space_power = self.space.process(sample, oldest);
        let mark_power = self.mark_agc.filter(mark_power);
        let space_power = self.space_agc.filter(space_power);
        let symbol = (mark_power - space_power).clamp(-self.sym_clip, self.sym_clip) / self.sym_clip;
        self.post_lpf.filter(symbol)
    }
}

/// FM-style quadrature discriminator around the center frequency.
pub struct QuadratureDemod {
    lo: Complex32,
    increment: Complex32,
    i_lpf: LowPass,
    q_lpf: LowPass,
    post_lpf: LowPass,
    prev_phase: f32,
    scale: f32,
}

impl QuadratureDemod {
    pub fn new(params: DemodParams) -> Self {
        let center = (params.mark_freq + params.space_freq) / 2.0;
        let deviation = (params.mark_freq - params.space_freq).abs() / 2.0;
        let omega = 2.0 * std::f32::consts::PI * center / params.sample_rate;
        let iq_cutoff = 0.544 * (params.mark_freq - params.space_freq).abs();
        Self {
            lo: Complex32::new(1.0, 0.0),
            increment: Complex32::new(omega.cos(), omega.sin()),
            i_lpf: LowPass::new(4, iq_cutoff, params.sample_rate),
            q_lpf: LowPass::new(4, iq_cutoff, params.sample_rate),
            post_lpf: LowPass::new(4, 0.575 * params.baud_rate, params.sample_rate),
            prev_phase: 0.0,
            scale: params.sample_rate / (2.0 * std::f32::consts::PI * deviation),
        }
    }
}

impl Demodulator for QuadratureDemod {
    fn process(&mut self, sample: f32) -> f32 {
        self.lo *= self.increment;

        let i_in = sample * self.lo.re;
        let q_in = sample * self.lo.im;
        let i = self.i_lpf.filter(i_in);
        let q = self.q_lpf.filter(q_in);

        let phase = q.atan2(i);
        let mut delta = phase - self.prev_phase;
        while delta > std::f32::consts::PI {
            delta -= 2.0 * std::f32::consts::PI;
        }
        while delta <= -std::f32::consts::PI {
            delta += 2.0 * std::f32::consts::PI;
        }
        self.prev_phase = phase;

        self.post_lpf.filter(delta * self.scale)
    }
}
