//! HDLC framing and deframing: bit stuffing, flag delimiters, and
//! frame-check-sequence handling around a raw byte payload.

use tinyvec::ArrayVec;

use crate::crc::crc_ccitt;
use crate::nrzi;

const FLAG: u8 = 0x7e;
const MAX_BYTE_BUFFER: usize = 512;

/// Builds the bitstream for one HDLC frame: leading flags, stuffed and
/// NRZI-encoded payload and FCS, trailing flags.
pub struct HdlcFramer {
    head_flags: u32,
    tail_flags: u32,
}

impl HdlcFramer {
    /// `tx_delay_ms`/`tx_tail_ms` are converted to flag counts via
    /// `ceil(0.001 * time_ms * baud / 8)`.
    pub fn new(tx_delay_ms: f32, tx_tail_ms: f32, baud: f32) -> Self {
        let flags_for = |ms: f32| ((0.001 * ms * baud / 8.0).ceil() as u32).max(0);
        Self {
            head_flags: flags_for(tx_delay_ms),
            tail_flags: flags_for(tx_tail_ms),
        }
    }

    /// Produce the full bit sequence (one bit per output byte, 0 or 1)
    /// for transmitting `payload`.
    pub fn frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut bits = Vec::new();
        let mut nrzi = nrzi::Encoder::new();

        for _ in 0..self.head_flags {
            emit_flag_unstuffed(&mut bits, &mut nrzi);
        }

        let mut ones_run = 0u32;
        for &byte in payload {
            emit_byte_stuffed(byte, &mut bits, &mut nrzi, &mut ones_run);
        }

        let fcs = crc_ccitt(payload);
        for &byte in &fcs.to_le_bytes() {
            emit_byte_stuffed(byte, &mut bits, &mut nrzi, &mut ones_run);
        }

        for _ in 0..self.tail_flags {
            emit_flag_unstuffed(&mut bits, &mut nrzi);
        }

        bits
    }
}

fn emit_flag_unstuffed(bits: &mut Vec<u8>, nrzi: &mut nrzi::Encoder) {
    for i in 0..8 {
        let bit = (FLAG >> i) & 1 != 0;
        bits.push(nrzi.encode(bit) as u8);
    }
}

fn emit_byte_stuffed(byte: u8, bits: &mut Vec<u8>, nrzi: &mut nrzi::Encoder, ones_run: &mut u32) {
    for i in 0..8 {
        let bit = (byte >> i) & 1 != 0;
        emit_bit_stuffed(bit, bits, nrzi, ones_run);
    }
}

fn emit_bit_stuffed(bit: bool, bits: &mut Vec<u8>, nrzi: &mut nrzi::Encoder, ones_run: &mut u32) {
    bits.push(nrzi.encode(bit) as u8);
    if bit {
        *ones_run += 1;
        if *ones_run == 5 {
            bits.push(nrzi.encode(false) as u8);
            *ones_run = 0;
        }
    } else {
        *ones_run = 0;
    }
}

/// Outcome of pushing one raw (NRZI-encoded) bit into the deframer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeframeOutcome {
    /// No flag boundary reached yet.
    Pending,
    /// A flag boundary closed an empty or sub-minimum-size candidate.
    Ignored,
    /// A flag boundary closed a frame below `min_frame_size`.
    TooSmall,
    /// A flag boundary closed a frame whose FCS didn't match.
    InvalidFcs,
    /// A successfully decoded frame (FCS stripped).
    Frame(Vec<u8>),
}

/// State machine turning a raw HDLC bitstream into frames.
pub struct HdlcDeframer {
    nrzi: nrzi::Decoder,
    shift_reg: u8,
    ones_run: u32,
    unstuffed_bits: u8,
    unstuffed_count: u32,
    bytes: ArrayVec<[u8; MAX_BYTE_BUFFER]>,
    min_frame_size: usize,
}

impl HdlcDeframer {
    pub fn new(min_frame_size: usize) -> Self {
        Self {
            nrzi: nrzi::Decoder::new(),
            shift_reg: 0,
            ones_run: 0,
            unstuffed_bits: 0,
            unstuffed_count: 0,
            bytes: ArrayVec::new(),
            min_frame_size,
        }
    }

    fn reset(&mut self) {
        self.shift_reg = 0;
        self.ones_run = 0;
        self.unstuffed_bits = 0;
        self.unstuffed_count = 0;
        self.bytes.clear();
    }

    /// Push one raw (not yet NRZI-decoded) line bit.
    pub fn push_bit(&mut self, raw_bit: bool) -> DeframeOutcome {
        let bit = self.nrzi.decode(raw_bit);
        self.shift_reg = (self.shift_reg >> 1) | ((bit as u8) << 7);

        if self.shift_reg == FLAG {
            let result = self.close_frame();
            self.reset();
            return result;
        }

        if self.ones_run >= 5 {
            // Stuffed zero: consume and discard it, do not feed into
            // the unstuffed register.
            self.ones_run = 0;
            return DeframeOutcome::Pending;
        }

        if bit {
            self.ones_run += 1;
        } else {
            self.ones_run = 0;
        }

        self.unstuffed_bits = (self.unstuffed_bits >> 1) | ((bit as u8) << 7);
        self.unstuffed_count += 1;
        if self.unstuffed_count == 8 {
            self.unstuffed_count = 0;
            if self.bytes.len() >= MAX_BYTE_BUFFER {
                self.reset();
                return DeframeOutcome::Pending;
            }
            self.bytes.push(self.unstuffed_bits);
        }

        DeframeOutcome::Pending
    }

    fn close_frame(&self) -> DeframeOutcome {
        if self.bytes.len() < 2 {
            return DeframeOutcome::Ignored;
        }
        let payload_len = self.bytes.len() - 2;
        if payload_len == 0 {
            return DeframeOutcome::Ignored;
        }
        if payload_len < self.min_frame_size {
            return DeframeOutcome::TooSmall;
        }

        let payload = &self.bytes[..payload_len];
        let fcs_bytes = &self.bytes[payload_len..];
        let received_fcs = u16::from_le_bytes([fcs_bytes[0], fcs_bytes[1]]);
        let computed_fcs = crc_ccitt(payload);

        if computed_fcs == received_fcs {
            DeframeOutcome::Frame(payload.to_vec())
        } else {
            DeframeOutcome::InvalidFcs
        }
    }
}
