// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Why a cycle produced no distance for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFault {
    /// Bus transfer failed
    BusFault,
    /// Driver returned a non-positive distance
    InvalidReading(i32),
    /// Sensor no longer answers
    NotConnected,
    /// Device was not ranging this cycle
    NotRanging,
}

/// One cycle's reading for one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Distance in millimetres
    Distance(u32),
    Fault(SampleFault),
}

impl Sample {
    /// Classify a raw driver reading (`<= 0` is invalid)
    pub fn from_reading(distance_mm: i32) -> Self {
        if distance_mm > 0 {
            Sample::Distance(distance_mm as u32)
        } else {
            Sample::Fault(SampleFault::InvalidReading(distance_mm))
        }
    }

    pub fn distance(&self) -> Option<u32> {
        match self {
            Sample::Distance(mm) => Some(*mm),
            Sample::Fault(_) => None,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Sample::Fault(_))
    }
}

impl From<Option<u32>> for Sample {
    fn from(value: Option<u32>) -> Self {
        match value {
            Some(mm) => Sample::Distance(mm),
            None => Sample::Fault(SampleFault::BusFault),
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sample::Distance(mm) => write!(f, "{}mm", mm),
            Sample::Fault(fault) => write!(f, "fault({:?})", fault),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_readings_are_faults() {
        assert_eq!(Sample::from_reading(120), Sample::Distance(120));
        assert_eq!(
            Sample::from_reading(0),
            Sample::Fault(SampleFault::InvalidReading(0))
        );
        assert!(Sample::from_reading(-1).is_fault());
        assert_eq!(Sample::from_reading(-1).distance(), None);
    }
}
