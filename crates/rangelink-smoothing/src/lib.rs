// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # rangelink-smoothing
//!
//! Per-sensor smoothing for distance streams: a responsive filter that
//! holds still on noise and follows real movement quickly, and a bank of
//! them indexed by device.

pub mod bank;
pub mod responsive;

pub use bank::FilterBank;
pub use responsive::{snap_curve, FilterConfig, ResponsiveFilter, DEFAULT_RESOLUTION};
