//! KISS framing between a host and the TNC: FEND-delimited frames
//! with byte-stuffed escapes for FEND/FESC inside the payload.

const FEND: u8 = 0xc0;
const FESC: u8 = 0xdb;
const TFEND: u8 = 0xdc;
const TFESC: u8 = 0xdd;
const MAX_PAYLOAD: usize = 256;

/// Encode `data` as a KISS data frame on `port` with command `cmd`
/// (0 = data frame).
pub fn encode(port: u8, cmd: u8, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 4);
    out.push(FEND);
    out.push((port << 4) | (cmd & 0x0f));
    for &byte in data {
        match byte {
            FEND => {
                out.push(FESC);
                out.push(TFEND);
            }
            FESC => {
                out.push(FESC);
                out.push(TFESC);
            }
            other => out.push(other),
        }
    }
    out.push(FEND);
    out
}

/// A complete decoded KISS message: port, command, and payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub port: u8,
    pub command: u8,
    pub payload: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    OutOfFrame,
    AwaitingHeader,
    InFrame,
    Escaped,
}

/// Byte-by-byte KISS decoder state machine.
pub struct Decoder {
    state: State,
    port: u8,
    command: u8,
    buffer: Vec<u8>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            state: State::OutOfFrame,
            port: 0,
            command: 0,
            buffer: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.state = State::OutOfFrame;
        self.buffer.clear();
    }

    /// Feed one byte. Returns a completed message when a closing FEND
    /// is seen on a non-empty data frame.
    pub fn decode_byte(&mut self, byte: u8) -> Option<Message> {
        match self.state {
            State::OutOfFrame => {
                if byte == FEND {
                    self.state = State::AwaitingHeader;
                }
                None
            }
            State::AwaitingHeader => {
                if byte == FEND {
                    return None;
                }
                self.port = (byte >> 4) & 0x0f;
                self.command = byte & 0x0f;
                self.buffer.clear();
                self.state = State::InFrame;
                None
            }
            State::InFrame => match byte {
                FEND => {
                    let message = if self.buffer.is_empty() {
                        None
                    } else {
                        Some(Message {
                            port: self.port,
                            command: self.command,
                            payload: std::mem::take(&mut self.buffer),
                        })
                    };
                    self.state = State::AwaitingHeader;
                    message
                }
                FESC => {
                    self.state = State::Escaped;
                    None
                }
                other => {
                    if self.buffer.len() >= MAX_PAYLOAD {
                        self.reset();
                        return None;
                    }
                    self.buffer.push(other);
                    None
                }
            },
            State::Escaped => {
                let decoded = match byte {
                    TFEND => Some(FEND),
                    TFESC => Some(FESC),
                    _ => None,
                };
                match decoded {
                    Some(value) => {
                        if self.buffer.len() >= MAX_PAYLOAD {
                            self.reset();
                            return None;
                        }
                        self.buffer.push(value);
                        self.state = State::InFrame;
                    }
                    None => {
                        // Invalid escape: reset to out-of-frame.
                        self.reset();
                    }
                }
                None
            }
        }
    }
}
