//! Per-image render target.

use crate::error::{ForecastError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Default image size in pixels.
pub const DEFAULT_SIZE: (u32, u32) = (1000, 600);

/// Where and how large one image is rendered.
///
/// Every chart function takes its own context, draws into an in-memory
/// bitmap and encodes it to `path` before returning. Existing files are
/// overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl RenderContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// White drawing area backed by a PNG bitmap at `path`.
    pub(crate) fn root(&self) -> Result<DrawingArea<BitMapBackend<'_>, Shift>> {
        if self.width == 0 || self.height == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        let root = BitMapBackend::new(&self.path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;
        Ok(root)
    }
}

/// Axis range covering every finite value, with a 5% margin.
///
/// Empty input gives `0..1`; a single distinct value is padded by 0.5.
pub(crate) fn padded_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        return 0.0..1.0;
    }
    if hi - lo < f64::EPSILON * lo.abs().max(1.0) {
        return lo - 0.5..hi + 0.5;
    }
    let margin = (hi - lo) * 0.05;
    lo - margin..hi + margin
}
