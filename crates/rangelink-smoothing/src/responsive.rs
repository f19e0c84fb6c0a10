// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Responsive (adaptive EMA) filter
//!
//! Small movements are smoothed hard, large ones pass through almost
//! untouched. The smoothing factor comes from a snap curve over the
//! distance between the input and the current value. A second EMA tracks
//! the error; while it stays under the activity threshold the filter
//! sleeps and holds its output.

/// Weight of the new error term in the error EMA
const ERROR_EMA_WEIGHT: f64 = 0.4;

/// Filter tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Hold the output while the error is below `activity_threshold`
    pub sleep_enable: bool,
    /// Error level needed to wake up
    pub activity_threshold: f64,
    /// Output range is `[0, resolution - 1]`; in millimetres this must
    /// cover the sensor's range plus its 8190 out-of-range code
    pub resolution: f64,
    /// Scales the input difference before the snap curve
    pub snap_multiplier: f64,
    /// Stretch inputs near either bound so the extremes are reachable
    pub snap_enable: bool,
}

/// Default output range, wide enough for every VL53L0X distance code
pub const DEFAULT_RESOLUTION: f64 = 8192.0;

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sleep_enable: true,
            activity_threshold: 2.5,
            resolution: DEFAULT_RESOLUTION,
            snap_multiplier: 0.5,
            snap_enable: false,
        }
    }
}

impl FilterConfig {
    /// Largest value the filter can output
    pub fn max_output(&self) -> f64 {
        self.resolution - 1.0
    }
}

/// Map a difference `x >= 0` to a smoothing factor in `[0, 1]`
///
/// `1 / (x + 1)` flipped and doubled: 0 at `x = 0`, rising steeply and
/// capped at 1 from `x = 1` on.
pub fn snap_curve(x: f64) -> f64 {
    let y = 1.0 / (x + 1.0);
    ((1.0 - y) * 2.0).min(1.0)
}

/// Stateful filter for one sensor
#[derive(Debug, Clone)]
pub struct ResponsiveFilter {
    config: FilterConfig,
    smoothed: f64,
    error_ema: f64,
    sleeping: bool,
}

impl ResponsiveFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            smoothed: 0.0,
            error_ema: 0.0,
            sleeping: false,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Feed one raw reading and return the smoothed integer value
    ///
    /// Non-finite input leaves the state untouched.
    pub fn filter(&mut self, raw: f64) -> u32 {
        if !raw.is_finite() {
            return self.value();
        }
        let threshold = self.config.activity_threshold;
        let resolution = self.config.resolution;

        let mut input = raw;
        if self.config.snap_enable {
            if input < threshold {
                input = input * 2.0 - threshold;
            } else if input > resolution - threshold {
                input = input * 2.0 - resolution + threshold;
            }
        }

        let delta = input - self.smoothed;
        let diff = delta.abs();
        self.error_ema += (delta - self.error_ema) * ERROR_EMA_WEIGHT;

        if self.config.sleep_enable {
            self.sleeping = self.error_ema.abs() < threshold;
        }
        if self.sleeping {
            return self.value();
        }

        let snap = snap_curve(diff * self.config.snap_multiplier);
        self.smoothed += delta * snap;
        self.smoothed = self.smoothed.clamp(0.0, self.config.max_output().max(0.0));

        self.value()
    }

    /// Current output
    pub fn value(&self) -> u32 {
        self.smoothed.floor() as u32
    }

    /// Current smoothed value before truncation
    pub fn smoothed(&self) -> f64 {
        self.smoothed
    }

    pub fn error_ema(&self) -> f64 {
        self.error_ema
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }
}

impl Default for ResponsiveFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
