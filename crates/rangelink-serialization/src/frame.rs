// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;

use crate::error::FrameError;

/// Most devices a frame can carry (one per multiplexer channel)
pub const MAX_DEVICES: usize = 8;

/// Largest datagram a receiver reads
pub const MAX_FRAME_BYTES: usize = 128;

/// Separates and terminates tokens
pub const DELIMITER: char = ' ';

/// Token sent in place of a distance when a reading failed
pub const FAULT_TOKEN: &str = "X";

/// First token of a discovery frame
pub const DISCOVERY_MARKER: &str = "#";

//region Encoder

/// Turns one cycle of readings into a text frame
///
/// # Format
/// ASCII, one token per device in discovery order, every token followed by a
/// single space. A distance is its value in millimetres, a fault is `X`:
/// ```text
/// "123 X 456 "
/// ```
/// At session start the streamer may send a discovery frame announcing the
/// device count, `"# 3 "`.
///
/// # Example
/// ```
/// use rangelink_serialization::FrameEncoder;
///
/// let encoder = FrameEncoder::new(3).unwrap();
/// assert_eq!(encoder.encode(&[Some(123), None, Some(456)]).unwrap(), "123 X 456 ");
/// assert_eq!(encoder.discovery_frame(), "# 3 ");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEncoder {
    device_count: usize,
}

impl FrameEncoder {
    /// Encoder for a fixed number of devices
    ///
    /// # Errors
    ///
    /// `InvalidDeviceCount` unless `1 <= device_count <= MAX_DEVICES`.
    pub fn new(device_count: usize) -> Result<Self, FrameError> {
        if device_count == 0 || device_count > MAX_DEVICES {
            return Err(FrameError::InvalidDeviceCount {
                count: device_count,
                max: MAX_DEVICES,
            });
        }
        Ok(Self { device_count })
    }

    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Encode one cycle; `None` marks a fault
    pub fn encode(&self, readings: &[Option<u32>]) -> Result<String, FrameError> {
        let mut frame = String::with_capacity(MAX_FRAME_BYTES);
        self.encode_into(readings, &mut frame)?;
        Ok(frame)
    }

    /// Encode into a reusable buffer (cleared first)
    pub fn encode_into(&self, readings: &[Option<u32>], frame: &mut String) -> Result<(), FrameError> {
        if readings.len() != self.device_count {
            return Err(FrameError::CardinalityMismatch {
                expected: self.device_count,
                actual: readings.len(),
            });
        }

        frame.clear();
        for reading in readings {
            match reading {
                Some(mm) => {
                    let _ = write!(frame, "{}", mm);
                }
                None => frame.push_str(FAULT_TOKEN),
            }
            frame.push(DELIMITER);
        }

        if frame.len() > MAX_FRAME_BYTES {
            return Err(FrameError::FrameTooLarge {
                size: frame.len(),
                max: MAX_FRAME_BYTES,
            });
        }
        Ok(())
    }

    /// Frame announcing the device count
    pub fn discovery_frame(&self) -> String {
        format!("{}{}{}{}", DISCOVERY_MARKER, DELIMITER, self.device_count, DELIMITER)
    }
}

//endregion

//region Parser

/// One token of a data frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Distance(i64),
    Fault,
    /// Neither a number nor the fault token
    Malformed,
}

impl Token {
    fn parse(text: &str) -> Self {
        if text == FAULT_TOKEN {
            return Token::Fault;
        }
        text.parse::<i64>().map(Token::Distance).unwrap_or(Token::Malformed)
    }
}

/// A parsed datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datagram {
    /// `"# <count> "`
    Discovery { device_count: usize },
    Data(Vec<Token>),
}

/// Split a received datagram into tokens
///
/// Trailing whitespace is the terminator. A frame that lost its final
/// delimiter is still accepted.
pub fn parse_datagram(bytes: &[u8]) -> Result<Datagram, FrameError> {
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(FrameError::FrameTooLarge {
            size: bytes.len(),
            max: MAX_FRAME_BYTES,
        });
    }
    let text = std::str::from_utf8(bytes).map_err(|_| FrameError::NotUtf8)?;
    let body = text.trim_end();
    if body.is_empty() {
        return Err(FrameError::Empty);
    }

    let mut pieces = body.split(DELIMITER);
    if body.starts_with(DISCOVERY_MARKER) {
        let marker = pieces.next();
        let count = pieces.next().and_then(|c| c.parse::<usize>().ok());
        return match (marker, count, pieces.next()) {
            (Some(DISCOVERY_MARKER), Some(device_count), None)
                if (1..=MAX_DEVICES).contains(&device_count) =>
            {
                Ok(Datagram::Discovery { device_count })
            }
            _ => Err(FrameError::InvalidDiscovery(body.to_string())),
        };
    }

    let tokens: Vec<Token> = pieces.map(Token::parse).collect();
    if tokens.len() > MAX_DEVICES {
        return Err(FrameError::InvalidDeviceCount {
            count: tokens.len(),
            max: MAX_DEVICES,
        });
    }
    Ok(Datagram::Data(tokens))
}

//endregion
