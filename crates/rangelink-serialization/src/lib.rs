// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # rangelink-serialization
//!
//! The rangelink wire format: space-delimited ASCII distances with `X` for
//! faults, plus an optional discovery frame that announces the sensor
//! count. Includes the receiver side: a decoder that locks the sensor count
//! and a fixed-width plot window.

pub mod decoder;
pub mod error;
pub mod frame;
pub mod plot_window;

pub use decoder::{
    CardinalityPolicy, DecodeError, DecodeOutcome, DecodedFrame, DecoderStats, StreamDecoder,
};
pub use error::FrameError;
pub use frame::{
    parse_datagram, Datagram, FrameEncoder, Token, DELIMITER, DISCOVERY_MARKER, FAULT_TOKEN,
    MAX_DEVICES, MAX_FRAME_BYTES,
};
pub use plot_window::{PlotWindow, DEFAULT_WINDOW_WIDTH};
