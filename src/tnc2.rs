//! TNC2 monitor text format: `SOURCE[-SSID]>DEST[-SSID][,PATH[-SSID][*]]…:info`.

use std::fmt;

use crate::ax25::{Ax25Addr, Ax25Packet, DEFAULT_CONTROL, DEFAULT_PROTOCOL};

#[derive(Clone, Debug)]
pub enum Tnc2Error {
    MissingSeparator,
    InvalidCallsign,
    InvalidSsid,
    InfoTooLong,
}

impl fmt::Display for Tnc2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tnc2Error::MissingSeparator => write!(f, "missing '>' or ':' separator"),
            Tnc2Error::InvalidCallsign => write!(f, "callsign is not 1..6 alphanumeric characters"),
            Tnc2Error::InvalidSsid => write!(f, "SSID outside 0..15"),
            Tnc2Error::InfoTooLong => write!(f, "info field longer than 256 bytes"),
        }
    }
}

impl std::error::Error for Tnc2Error {}

fn format_addr(addr: &Ax25Addr) -> String {
    let mut s = addr.callsign.clone();
    if addr.ssid != 0 {
        s.push('-');
        s.push_str(&addr.ssid.to_string());
    }
    if addr.repeated {
        s.push('*');
    }
    s
}

fn parse_addr(text: &str) -> Result<Ax25Addr, Tnc2Error> {
    let (text, repeated) = match text.strip_suffix('*') {
        Some(stripped) => (stripped, true),
        None => (text, false),
    };

    let (callsign, ssid) = match text.split_once('-') {
        Some((call, ssid_str)) => {
            let ssid: u8 = ssid_str.parse().map_err(|_| Tnc2Error::InvalidSsid)?;
            if ssid > 15 {
                return Err(Tnc2Error::InvalidSsid);
            }
            (call, ssid)
        }
        None => (text, 0),
    };

    if callsign.is_empty() || callsign.len() > 6 || !callsign.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Tnc2Error::InvalidCallsign);
    }

    Ok(Ax25Addr {
        callsign: callsign.to_string(),
        ssid,
        repeated,
    })
}

/// Render a packet into one TNC2 text line (no trailing newline).
pub fn encode(packet: &Ax25Packet) -> String {
    let mut line = format!("{}>{}", format_addr(&packet.source), format_addr(&packet.destination));
    for addr in &packet.path {
        line.push(',');
        line.push_str(&format_addr(addr));
    }
    line.push(':');
    line.push_str(&String::from_utf8_lossy(&packet.info));
    line
}

/// Parse one TNC2 text line into a packet.
pub fn decode(line: &str) -> Result<Ax25Packet, Tnc2Error> {
    let (header, info) = line.split_once(':').ok_or(Tnc2Error::MissingSeparator)?;
    if info.len() > 256 {
        return Err(Tnc2Error::InfoTooLong);
    }

    let (source_text, rest) = header.split_once('>').ok_or(Tnc2Error::MissingSeparator)?;
    let source = parse_addr(source_text)?;

    let mut fields = rest.split(',');
    let dest_text = fields.next().ok_or(Tnc2Error::MissingSeparator)?;
    let destination = parse_addr(dest_text)?;

    let mut path = Vec::new();
    for field in fields {
        path.push(parse_addr(field)?);
    }

    Ok(Ax25Packet {
        destination,
        source,
        path,
        control: DEFAULT_CONTROL,
        protocol: DEFAULT_PROTOCOL,
        info: info.as_bytes().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let packet = Ax25Packet {
            destination: Ax25Addr {
                callsign: "APN001".to_string(),
                ssid: 0,
                repeated: false,
            },
            source: Ax25Addr {
                callsign: "XX0TST".to_string(),
                ssid: 7,
                repeated: false,
            },
            path: vec![Ax25Addr {
                callsign: "WIDE2".to_string(),
                ssid: 2,
                repeated: false,
            }],
            control: DEFAULT_CONTROL,
            protocol: DEFAULT_PROTOCOL,
            info: b"!5221.20N/02043.85E# TEST".to_vec(),
        };
        let text = encode(&packet);
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn decodes_repeated_path_entry() {
        let packet = decode("N0CALL>APN001,RPTD*:test!abcdefghijkl").unwrap();
        assert_eq!(packet.path.len(), 1);
        assert_eq!(packet.path[0].callsign, "RPTD");
        assert!(packet.path[0].repeated);
        assert_eq!(packet.info.len(), 17);
    }

    #[test]
    fn ssid_zero_is_elided_on_encode() {
        let packet = Ax25Packet {
            destination: Ax25Addr {
                callsign: "DEST".to_string(),
                ssid: 0,
                repeated: false,
            },
            source: Ax25Addr {
                callsign: "SRC".to_string(),
                ssid: 0,
                repeated: false,
            },
            path: vec![],
            control: DEFAULT_CONTROL,
            protocol: DEFAULT_PROTOCOL,
            info: b"hi".to_vec(),
        };
        assert_eq!(encode(&packet), "SRC>DEST:hi");
    }

    #[test]
    fn rejects_ssid_above_fifteen() {
        assert!(decode("N0CALL-16>APN001:hi").is_err());
    }

    #[test]
    fn rejects_non_alphanumeric_callsign() {
        assert!(decode("N0-CALL>APN001:hi").is_err());
    }

    #[test]
    fn rejects_missing_colon_separator() {
        assert!(decode("N0CALL>APN001 no colon here").is_err());
    }
}
