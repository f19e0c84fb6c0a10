// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use tracing::debug;

use crate::responsive::{FilterConfig, ResponsiveFilter};

/// One responsive filter per device index
///
/// Readings are `Option<u32>`, with `None` standing for a fault. Faults pass
/// through as `None` and leave that device's filter untouched.
#[derive(Debug, Clone)]
pub struct FilterBank {
    config: FilterConfig,
    filters: Vec<ResponsiveFilter>,
}

impl FilterBank {
    pub fn new(count: usize, config: FilterConfig) -> Self {
        Self {
            config,
            filters: vec![ResponsiveFilter::new(config); count],
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Replace every filter with a fresh one for `count` devices
    pub fn reset(&mut self, count: usize) {
        debug!("Resetting filter bank to {} filter(s)", count);
        self.filters = vec![ResponsiveFilter::new(self.config); count];
    }

    pub fn filter(&self, index: usize) -> Option<&ResponsiveFilter> {
        self.filters.get(index)
    }

    /// Filter one device's reading
    ///
    /// Indices beyond the bank get a fresh filter.
    pub fn apply_one(&mut self, index: usize, reading: Option<u32>) -> Option<u32> {
        let reading = reading?;
        if index >= self.filters.len() {
            self.filters
                .resize_with(index + 1, || ResponsiveFilter::new(self.config));
        }
        Some(self.filters[index].filter(reading as f64))
    }

    /// Filter one cycle of readings, position `i` going to filter `i`
    pub fn apply(&mut self, readings: &[Option<u32>]) -> Vec<Option<u32>> {
        readings
            .iter()
            .enumerate()
            .map(|(index, reading)| self.apply_one(index, *reading))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faults_bypass_filters() {
        let mut bank = FilterBank::new(2, FilterConfig::default());
        assert_eq!(bank.apply(&[Some(300), Some(500)]), vec![Some(300), Some(500)]);

        let error_before = bank.filter(1).unwrap().error_ema();
        assert_eq!(bank.apply(&[Some(300), None]), vec![Some(300), None]);
        assert_eq!(bank.filter(1).unwrap().error_ema(), error_before);
    }

    #[test]
    fn test_filters_are_independent() {
        let mut bank = FilterBank::new(2, FilterConfig::default());
        for _ in 0..10 {
            bank.apply(&[Some(100), Some(900)]);
        }
        assert_eq!(bank.filter(0).unwrap().value(), 100);
        assert_eq!(bank.filter(1).unwrap().value(), 900);
    }

    #[test]
    fn test_reset_rebuilds_state() {
        let mut bank = FilterBank::new(1, FilterConfig::default());
        bank.apply(&[Some(700)]);
        bank.reset(3);
        assert_eq!(bank.len(), 3);
        assert!(bank.filters.iter().all(|f| f.value() == 0));
    }

    #[test]
    fn test_grows_for_unknown_index() {
        let mut bank = FilterBank::new(1, FilterConfig::default());
        assert_eq!(bank.apply_one(3, Some(42)), Some(42));
        assert_eq!(bank.len(), 4);
    }
}
