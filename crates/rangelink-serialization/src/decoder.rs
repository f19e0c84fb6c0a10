// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Stream decoder
//!
//! The receiver does not know in advance how many sensors are streaming.
//! The count is locked by a discovery frame when one arrives, or inferred
//! from the first data frame otherwise. Later frames of a different size
//! are handled by the [`CardinalityPolicy`].

use std::fmt;
use std::str::FromStr;

use rangelink_smoothing::{FilterBank, FilterConfig};
use tracing::{debug, info, warn};

use crate::error::FrameError;
use crate::frame::{parse_datagram, Datagram, Token};

/// What to do with a data frame whose size differs from the locked count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardinalityPolicy {
    /// Drop the frame and report `CardinalityMismatch`
    #[default]
    Reject,
    /// Truncate extra tokens, pad missing ones with faults
    Resize,
}

impl fmt::Display for CardinalityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CardinalityPolicy::Reject => "reject",
            CardinalityPolicy::Resize => "resize",
        })
    }
}

impl FromStr for CardinalityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(CardinalityPolicy::Reject),
            "resize" => Ok(CardinalityPolicy::Resize),
            other => Err(format!("unknown cardinality policy '{}'", other)),
        }
    }
}

/// Errors from [`StreamDecoder::decode`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Frame size differs from the locked count (policy `Reject`)
    #[error("frame has {actual} value(s), stream carries {expected}")]
    CardinalityMismatch { expected: usize, actual: usize },
}

/// One decoded data frame
///
/// All three vectors have one entry per sensor. Faulty or malformed
/// tokens read as 0 in both `raw` and `filtered`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Count of accepted data frames before this one
    pub sequence: u64,
    pub raw: Vec<i64>,
    pub filtered: Vec<i64>,
    pub faults: Vec<bool>,
}

impl DecodedFrame {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn fault_count(&self) -> usize {
        self.faults.iter().filter(|f| **f).count()
    }
}

/// What a datagram did to the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Discovery frame locked the sensor count; buffers should be reset
    Locked { device_count: usize, relocked: bool },
    Frame(DecodedFrame),
}

/// Decoder counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames_accepted: u64,
    pub frames_rejected: u64,
    pub malformed_tokens: u64,
    /// Times the count was locked or re-locked
    pub locks: u64,
}

/// Reassembles per-sensor values from a stream of datagrams
pub struct StreamDecoder {
    policy: CardinalityPolicy,
    filter_config: Option<FilterConfig>,
    device_count: Option<usize>,
    filters: FilterBank,
    stats: DecoderStats,
}

impl StreamDecoder {
    /// Decoder that smooths values with `filter_config` (or passes them
    /// through when `None`)
    pub fn new(policy: CardinalityPolicy, filter_config: Option<FilterConfig>) -> Self {
        Self {
            policy,
            filter_config,
            device_count: None,
            filters: FilterBank::new(0, filter_config.unwrap_or_default()),
            stats: DecoderStats::default(),
        }
    }

    /// Sensor count, once known
    pub fn device_count(&self) -> Option<usize> {
        self.device_count
    }

    pub fn policy(&self) -> CardinalityPolicy {
        self.policy
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Decode one datagram
    ///
    /// # Errors
    ///
    /// Unparseable datagrams and (under `Reject`) wrongly sized frames. The
    /// decoder state is unchanged in both cases apart from the counters.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<DecodeOutcome, DecodeError> {
        let datagram = match parse_datagram(bytes) {
            Ok(datagram) => datagram,
            Err(e) => {
                self.stats.frames_rejected += 1;
                debug!("Dropping datagram: {}", e);
                return Err(e.into());
            }
        };

        match datagram {
            Datagram::Discovery { device_count } => {
                let relocked = self.device_count.is_some();
                self.lock(device_count);
                Ok(DecodeOutcome::Locked {
                    device_count,
                    relocked,
                })
            }
            Datagram::Data(tokens) => self.decode_tokens(tokens).map(DecodeOutcome::Frame),
        }
    }

    fn lock(&mut self, device_count: usize) {
        match self.device_count {
            Some(previous) if previous != device_count => {
                info!("Stream re-locked: {} -> {} sensor(s)", previous, device_count)
            }
            Some(_) => debug!("Stream re-locked at {} sensor(s)", device_count),
            None => info!("📡 Stream locked at {} sensor(s)", device_count),
        }
        self.device_count = Some(device_count);
        self.filters.reset(device_count);
        self.stats.locks += 1;
    }

    fn decode_tokens(&mut self, mut tokens: Vec<Token>) -> Result<DecodedFrame, DecodeError> {
        let expected = match self.device_count {
            Some(count) => count,
            None => {
                self.lock(tokens.len());
                tokens.len()
            }
        };

        if tokens.len() != expected {
            match self.policy {
                CardinalityPolicy::Reject => {
                    self.stats.frames_rejected += 1;
                    warn!(
                        "Rejecting frame with {} value(s), stream carries {}",
                        tokens.len(),
                        expected
                    );
                    return Err(DecodeError::CardinalityMismatch {
                        expected,
                        actual: tokens.len(),
                    });
                }
                CardinalityPolicy::Resize => {
                    debug!("Resizing frame from {} to {} value(s)", tokens.len(), expected);
                    tokens.resize(expected, Token::Fault);
                }
            }
        }

        let mut frame = DecodedFrame {
            sequence: self.stats.frames_accepted,
            raw: Vec::with_capacity(expected),
            filtered: Vec::with_capacity(expected),
            faults: Vec::with_capacity(expected),
        };

        for (index, token) in tokens.into_iter().enumerate() {
            match token {
                Token::Distance(value) => {
                    let filtered = match self.filter_config {
                        Some(_) => self
                            .filters
                            .apply_one(index, Some(value.clamp(0, u32::MAX as i64) as u32))
                            .map_or(0, i64::from),
                        None => value,
                    };
                    frame.raw.push(value);
                    frame.filtered.push(filtered);
                    frame.faults.push(false);
                }
                Token::Fault | Token::Malformed => {
                    if token == Token::Malformed {
                        self.stats.malformed_tokens += 1;
                    }
                    frame.raw.push(0);
                    frame.filtered.push(0);
                    frame.faults.push(true);
                }
            }
        }

        self.stats.frames_accepted += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("Resize".parse::<CardinalityPolicy>(), Ok(CardinalityPolicy::Resize));
        assert_eq!(CardinalityPolicy::default().to_string(), "reject");
        assert!("grow".parse::<CardinalityPolicy>().is_err());
    }

    #[test]
    fn test_unfiltered_decoder_passes_values_through() {
        let mut decoder = StreamDecoder::new(CardinalityPolicy::Reject, None);
        let outcome = decoder.decode(b"3 X 1 ").unwrap();
        let DecodeOutcome::Frame(frame) = outcome else {
            panic!("expected a data frame");
        };
        assert_eq!(frame.filtered, vec![3, 0, 1]);
        assert_eq!(frame.fault_count(), 1);
    }

    #[test]
    fn test_parse_errors_count_as_rejected() {
        let mut decoder = StreamDecoder::new(CardinalityPolicy::Reject, None);
        assert!(decoder.decode(b"").is_err());
        assert_eq!(decoder.stats().frames_rejected, 1);
        assert_eq!(decoder.device_count(), None);
    }
}
