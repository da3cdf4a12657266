//! Soundcard AX.25 packet TNC core.
//!
//! This crate implements the numerical and link-layer pipeline of a
//! Bell 202 AFSK terminal node controller: Goertzel and quadrature FM
//! demodulators feeding a bit-clock recovery PLL, HDLC framing with bit
//! stuffing, AX.25 unnumbered-information packing, and adapters to the
//! KISS and TNC2 wire formats used by external clients.
//!
//! Audio I/O, network sockets, argument parsing and configuration file
//! loading are intentionally outside this crate: it consumes and
//! produces plain `f32` sample slices and leaves the event loop that
//! feeds them to the host application.

pub mod ax25;
pub mod bitclock;
pub mod crc;
pub mod dedup;
pub mod demod;
pub mod demod_bank;
pub mod dynamics;
pub mod filter;
pub mod goertzel;
pub mod hdlc;
pub mod kiss;
pub mod modem;
pub mod modulator;
pub mod nrzi;
pub mod oscillator;
pub mod ring;
pub mod squelch;
pub mod tnc2;

pub use ax25::{Ax25Addr, Ax25Error, Ax25Packet};
pub use demod::DemodParams;
pub use demod_bank::DemodVariant;
pub use modem::{Modem, ModemParams};
