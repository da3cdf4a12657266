//! AX.25 unnumbered-information (UI) packet packing and unpacking.

use std::fmt;

const ADDR_LEN: usize = 7;
const MAX_PATH: usize = 8;
const MAX_INFO: usize = 256;
pub const DEFAULT_CONTROL: u8 = 0x03;
pub const DEFAULT_PROTOCOL: u8 = 0xf0;

#[derive(Clone, Debug)]
pub enum Ax25Error {
    TooShort,
    InvalidCallsign,
    BufferTooSmall,
}

impl fmt::Display for Ax25Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ax25Error::TooShort => write!(f, "packet buffer too short"),
            Ax25Error::InvalidCallsign => write!(f, "callsign is not 1..6 alphanumeric characters"),
            Ax25Error::BufferTooSmall => write!(f, "output buffer too small"),
        }
    }
}

impl std::error::Error for Ax25Error {}

/// One AX.25 address: callsign (space-padded to 6 characters), SSID,
/// and the "has-been-repeated" flag used on path addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ax25Addr {
    pub callsign: String,
    pub ssid: u8,
    pub repeated: bool,
}

impl Ax25Addr {
    pub fn new(callsign: &str, ssid: u8) -> Result<Self, Ax25Error> {
        Self::validate_callsign(callsign)?;
        Ok(Self {
            callsign: callsign.to_string(),
            ssid,
            repeated: false,
        })
    }

    fn validate_callsign(callsign: &str) -> Result<(), Ax25Error> {
        if callsign.is_empty() || callsign.len() > 6 || !callsign.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Ax25Error::InvalidCallsign);
        }
        Ok(())
    }

    fn pack(&self, is_last: bool, out: &mut [u8; ADDR_LEN]) {
        let padded: Vec<u8> = format!("{:<6}", self.callsign).into_bytes();
        for (i, &c) in padded.iter().enumerate().take(6) {
            out[i] = c << 1;
        }
        out[6] = ((self.repeated as u8) << 7) | 0x60 | (self.ssid << 1) | (is_last as u8);
    }

    fn unpack(bytes: &[u8; ADDR_LEN]) -> (Self, bool) {
        let mut chars = [0u8; 6];
        for (i, slot) in chars.iter_mut().enumerate() {
            *slot = bytes[i] >> 1;
        }
        let callsign = String::from_utf8_lossy(&chars)
            .trim_end()
            .to_string();
        let last_byte = bytes[6];
        let repeated = last_byte & 0x80 != 0;
        let ssid = (last_byte >> 1) & 0x0f;
        let is_last = last_byte & 0x01 != 0;
        (
            Self {
                callsign,
                ssid,
                repeated,
            },
            is_last,
        )
    }
}

/// A full AX.25 unnumbered-information packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ax25Packet {
    pub destination: Ax25Addr,
    pub source: Ax25Addr,
    pub path: Vec<Ax25Addr>,
    pub control: u8,
    pub protocol: u8,
    pub info: Vec<u8>,
}

impl Ax25Packet {
    pub fn new(destination: Ax25Addr, source: Ax25Addr, path: Vec<Ax25Addr>, info: Vec<u8>) -> Self {
        Self {
            destination,
            source,
            path,
            control: DEFAULT_CONTROL,
            protocol: DEFAULT_PROTOCOL,
            info,
        }
    }

    /// Wire size: `14 + 7*path_len + 2 + info_len`.
    pub fn wire_size(&self) -> usize {
        14 + ADDR_LEN * self.path.len() + 2 + self.info.len()
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_size());

        let mut dest_bytes = [0u8; ADDR_LEN];
        self.destination.pack(false, &mut dest_bytes);
        out.extend_from_slice(&dest_bytes);

        let mut src_bytes = [0u8; ADDR_LEN];
        self.source.pack(self.path.is_empty(), &mut src_bytes);
        out.extend_from_slice(&src_bytes);

        for (i, addr) in self.path.iter().enumerate() {
            let is_last = i == self.path.len() - 1;
            let mut bytes = [0u8; ADDR_LEN];
            addr.pack(is_last, &mut bytes);
            out.extend_from_slice(&bytes);
        }

        out.push(self.control);
        out.push(self.protocol);
        out.extend_from_slice(&self.info);
        out
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self, Ax25Error> {
        if bytes.len() < 2 * ADDR_LEN + 2 {
            return Err(Ax25Error::TooShort);
        }

        let mut pos = 0;
        let dest_bytes: [u8; ADDR_LEN] = bytes[pos..pos + ADDR_LEN].try_into().unwrap();
        let (destination, _) = Ax25Addr::unpack(&dest_bytes);
        pos += ADDR_LEN;

        let src_bytes: [u8; ADDR_LEN] = bytes[pos..pos + ADDR_LEN].try_into().unwrap();
        let (source, mut is_last) = Ax25Addr::unpack(&src_bytes);
        pos += ADDR_LEN;

        let mut path = Vec::new();
        while !is_last && path.len() < MAX_PATH && bytes.len() >= pos + ADDR_LEN {
            let addr_bytes: [u8; ADDR_LEN] = bytes[pos..pos + ADDR_LEN].try_into().unwrap();
            let (addr, last) = Ax25Addr::unpack(&addr_bytes);
            path.push(addr);
            is_last = last;
            pos += ADDR_LEN;
        }

        if bytes.len() < pos + 2 {
            return Err(Ax25Error::TooShort);
        }
        let control = bytes[pos];
        let protocol = bytes[pos + 1];
        pos += 2;

        let mut info = bytes[pos..].to_vec();
        if info.len() > MAX_INFO {
            log::warn!("AX.25 info field of {} bytes clipped to {MAX_INFO}", info.len());
            info.truncate(MAX_INFO);
        }

        Ok(Self {
            destination,
            source,
            path,
            control,
            protocol,
            info,
        })
    }
}
