// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::decoder::DecodedFrame;

/// Default number of points across the plot
pub const DEFAULT_WINDOW_WIDTH: usize = 100;

/// Fixed-width series buffer for a live plot
///
/// Keeps a raw and a filtered series per sensor. When the position counter
/// reaches the width, everything is cleared and the counter restarts, so
/// the sample that triggered the wrap leaves every series with one point.
#[derive(Debug, Clone)]
pub struct PlotWindow {
    width: usize,
    position: usize,
    xs: Vec<usize>,
    raw: Vec<Vec<i64>>,
    filtered: Vec<Vec<i64>>,
    wraps: u64,
}

impl PlotWindow {
    pub fn new(width: usize, series: usize) -> Self {
        Self {
            width: width.max(1),
            position: 0,
            xs: Vec::with_capacity(width),
            raw: vec![Vec::with_capacity(width); series],
            filtered: vec![Vec::with_capacity(width); series],
            wraps: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn series_count(&self) -> usize {
        self.raw.len()
    }

    /// Points currently held per series
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Times the window has wrapped
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    pub fn xs(&self) -> &[usize] {
        &self.xs
    }

    pub fn raw(&self, sensor: usize) -> Option<&[i64]> {
        self.raw.get(sensor).map(Vec::as_slice)
    }

    pub fn filtered(&self, sensor: usize) -> Option<&[i64]> {
        self.filtered.get(sensor).map(Vec::as_slice)
    }

    /// Drop all points and resize to `series` sensors
    pub fn reset(&mut self, series: usize) {
        self.position = 0;
        self.xs.clear();
        self.raw = vec![Vec::with_capacity(self.width); series];
        self.filtered = vec![Vec::with_capacity(self.width); series];
    }

    /// Append one frame, wrapping first if the window is full
    pub fn push(&mut self, frame: &DecodedFrame) {
        if frame.len() != self.series_count() {
            self.reset(frame.len());
        }
        if self.position >= self.width {
            self.position = 0;
            self.wraps += 1;
            self.xs.clear();
            self.raw.iter_mut().for_each(Vec::clear);
            self.filtered.iter_mut().for_each(Vec::clear);
        }

        self.xs.push(self.position);
        for (series, value) in self.raw.iter_mut().zip(&frame.raw) {
            series.push(*value);
        }
        for (series, value) in self.filtered.iter_mut().zip(&frame.filtered) {
            series.push(*value);
        }
        self.position += 1;
    }
}

impl Default for PlotWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_WIDTH, 0)
    }
}
