//! Two ring buffers: a single-threaded fixed-window history used by
//! the Goertzel demodulator, and a wait-free single-producer /
//! single-consumer sample ring used to hand transmit samples to the
//! audio driver.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Fixed-capacity float ring with a single `shift1` operation: insert
/// at the head, return the value that used to be there (zero before
/// the ring has wrapped once).
#[derive(Clone, Debug)]
pub struct RingHistory {
    buffer: Vec<f32>,
    head: usize,
}

impl RingHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity],
            head: 0,
        }
    }

    pub fn shift1(&mut self, sample: f32) -> f32 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        let old = self.buffer[self.head];
        self.buffer[self.head] = sample;
        self.head = (self.head + 1) % self.buffer.len();
        old
    }
}

/// Lock-free SPSC ring of `f32` samples. Indices are monotonic
/// counters wrapped by capacity only at access time, so `available()`
/// is a single subtraction with no modular arithmetic on the counters
/// themselves. Safe to share as `&SampleRing` between exactly one
/// producer thread and one consumer thread.
#[derive(Debug)]
pub struct SampleRing {
    buffer: Box<[AtomicU32]>,
    read_idx: AtomicUsize,
    write_idx: AtomicUsize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must not be zero");
        let buffer = (0..capacity).map(|_| AtomicU32::new(0)).collect();
        Self {
            buffer,
            read_idx: AtomicUsize::new(0),
            write_idx: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Samples currently buffered and unread.
    pub fn available(&self) -> usize {
        let write = self.write_idx.load(Ordering::Acquire);
        let read = self.read_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Producer side. Writes as many samples as fit; excess samples
    /// past capacity are dropped. Returns the number written.
    pub fn write(&self, samples: &[f32]) -> usize {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);
        let size = self.buffer.len();
        let available_space = size - write.wrapping_sub(read);
        let to_write = samples.len().min(available_space);

        for (i, &sample) in samples[..to_write].iter().enumerate() {
            let pos = (write.wrapping_add(i)) % size;
            self.buffer[pos].store(sample.to_bits(), Ordering::Relaxed);
        }

        self.write_idx
            .store(write.wrapping_add(to_write), Ordering::Release);
        to_write
    }

    /// Consumer side. Reads as many samples as are available, up to
    /// `out.len()`. Returns the number read.
    pub fn read(&self, out: &mut [f32]) -> usize {
        let write = self.write_idx.load(Ordering::Acquire);
        let read = self.read_idx.load(Ordering::Relaxed);
        let size = self.buffer.len();
        let available = write.wrapping_sub(read);
        let to_read = out.len().min(available);

        for (i, slot) in out[..to_read].iter_mut().enumerate() {
            let pos = (read.wrapping_add(i)) % size;
            *slot = f32::from_bits(self.buffer[pos].load(Ordering::Relaxed));
        }

        self.read_idx
            .store(read.wrapping_add(to_read), Ordering::Release);
        to_read
    }
}
