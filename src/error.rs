// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use rangelink_acquisition::AcquisitionError;
use rangelink_hal::HalError;
use rangelink_serialization::FrameError;
use rangelink_transports::TransportError;

/// Errors that end a streaming or receiving session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("acquisition: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("hardware: {0}")]
    Hal(#[from] HalError),

    #[error("frame: {0}")]
    Frame(#[from] FrameError),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// A config value that parsed but does not map onto the runtime types
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
