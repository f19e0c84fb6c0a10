// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Errors from encoding or parsing a single frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("device count {count} outside 1..={max}")]
    InvalidDeviceCount { count: usize, max: usize },

    /// Frame size differs from the agreed device count
    #[error("frame has {actual} token(s), expected {expected}")]
    CardinalityMismatch { expected: usize, actual: usize },

    #[error("frame of {size} bytes exceeds {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("frame is not valid UTF-8")]
    NotUtf8,

    #[error("empty frame")]
    Empty,

    #[error("malformed discovery frame '{0}'")]
    InvalidDiscovery(String),
}
