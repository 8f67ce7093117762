//! PNG rendering of model diagnostics.
//!
//! Each chart function receives its own [`RenderContext`] naming the
//! output file and image size, so no plotting state is shared between
//! images. Text is only rendered when the crate is built with the `ttf`
//! feature; without it charts contain lines, bands and bars only.

mod charts;
mod context;

pub use charts::{
    plot_forecast, plot_model_fit, plot_residual_diagnostics, DRAWS_TEXT, MAX_CORRELOGRAM_LAGS,
};
pub use context::{RenderContext, DEFAULT_SIZE};
