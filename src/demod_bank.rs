//! Multi-receiver fusion: runs several demodulator variants in
//! parallel over one sample stream, deduplicating frames they agree
//! on and surfacing at most one decoded frame per call.

use crate::crc::crc_ccitt;
use crate::dedup::{DedupCache, PushResult};
use crate::demod::{DemodParams, Demodulator, GoertzelDemod, QuadratureDemod};
use crate::hdlc::{DeframeOutcome, HdlcDeframer};

const DEDUP_EXPIRATION_SECONDS: u64 = 2;

/// Which demodulator variants to instantiate in a bank, as a bit-set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DemodVariant(u8);

impl DemodVariant {
    pub const GOERTZEL_OPTIMISTIC: Self = Self(1 << 0);
    pub const GOERTZEL_PESSIMISTIC: Self = Self(1 << 1);
    pub const QUADRATURE: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Self::GOERTZEL_OPTIMISTIC.0 | Self::GOERTZEL_PESSIMISTIC.0 | Self::QUADRATURE.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for DemodVariant {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

enum Variant {
    GoertzelOptimistic(GoertzelDemod),
    GoertzelPessimistic(GoertzelDemod),
    Quadrature(QuadratureDemod),
}

impl Variant {
    fn process(&mut self, sample: f32) -> f32 {
        match self {
            Variant::GoertzelOptimistic(d) => d.process(sample),
            Variant::GoertzelPessimistic(d) => d.process(sample),
            Variant::Quadrature(d) => d.process(sample),
        }
    }
}

struct Pipeline {
    demod: Variant,
    bitclock: crate::bitclock::Pll,
    deframer: HdlcDeframer,
}

/// A bank of up to 6 parallel receive pipelines sharing a dedup cache.
pub struct DemodBank {
    pipelines: Vec<Pipeline>,
    dedup: DedupCache,
    clock_ticks: u64,
}

fn expiration_in_samples(sample_rate: f32) -> u64 {
    (DEDUP_EXPIRATION_SECONDS as f32 * sample_rate) as u64
}

impl DemodBank {
    pub fn new(variants: DemodVariant, params: DemodParams) -> Self {
        let mut pipelines = Vec::new();
        let mut push = |variant: Variant| {
            pipelines.push(Pipeline {
                demod: variant,
                bitclock: crate::bitclock::Pll::new(params.sample_rate, params.baud_rate),
                deframer: HdlcDeframer::new(18),
            });
        };

        if variants.contains(DemodVariant::GOERTZEL_OPTIMISTIC) {
            push(Variant::GoertzelOptimistic(GoertzelDemod::optimistic(params)));
        }
        if variants.contains(DemodVariant::GOERTZEL_PESSIMISTIC) {
            push(Variant::GoertzelPessimistic(GoertzelDemod::pessimistic(params)));
        }
        if variants.contains(DemodVariant::QUADRATURE) {
            push(Variant::Quadrature(QuadratureDemod::new(params)));
        }

        assert!(
            pipelines.len() <= 6,
            "demodulator bank supports at most 6 pipelines"
        );

        Self {
            pipelines,
            dedup: DedupCache::new(expiration_in_samples(params.sample_rate)),
            clock_ticks: 0,
        }
    }

    /// Process one sample on every pipeline. Returns the first
    /// successfully decoded, non-duplicate frame, if any. Other
    /// pipelines that decoded the same call are discarded but have
    /// still advanced their state.
    pub fn process_sample(&mut self, sample: f32) -> Option<Vec<u8>> {
        let mut winner = None;
        for pipeline in self.pipelines.iter_mut() {
            let symbol = pipeline.demod.process(sample);
            if let crate::bitclock::BitSample::Bit(bit) = pipeline.bitclock.detect(symbol) {
                if let DeframeOutcome::Frame(payload) = pipeline.deframer.push_bit(bit) {
                    if winner.is_none() {
                        let crc = crc_ccitt(&payload);
                        if self.dedup.push(crc, self.clock_ticks) == PushResult::Fresh {
                            winner = Some(payload);
                        }
                    }
                }
            }
        }
        self.clock_ticks += 1;
        winner
    }

    /// Insert a frame's CRC into the dedup cache directly, used by the
    /// modem facade to suppress self-loop reception of transmitted
    /// frames.
    pub fn suppress(&mut self, payload: &[u8]) {
        let crc = crc_ccitt(payload);
        self.dedup.push(crc, self.clock_ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> DemodParams {
        DemodParams {
            mark_freq: 1200.0,
            space_freq: 2200.0,
            baud_rate: 1200.0,
            sample_rate: 22050.0,
        }
    }

    #[test]
    fn bank_with_no_variants_never_decodes() {
        let mut bank = DemodBank::new(DemodVariant::empty(), default_params());
        for _ in 0..1000 {
            assert!(bank.process_sample(0.0).is_none());
        }
    }

    #[test]
    fn bank_runs_multiple_pipelines_without_panicking() {
        let variants = DemodVariant::GOERTZEL_OPTIMISTIC | DemodVariant::QUADRATURE;
        let mut bank = DemodBank::new(variants, default_params());
        for i in 0..5000 {
            let s = (2.0 * std::f32::consts::PI * 1200.0 * i as f32 / 22050.0).sin();
            bank.process_sample(s);
        }
    }
}
