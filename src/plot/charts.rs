//! Model fit, residual diagnostics and forecast charts.

use crate::core::{Forecast, SeriesIndex, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::plot::context::{padded_range, RenderContext};
use crate::utils::stats::{acf, pacf};
use chrono::{DateTime, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::iter;
use tracing::debug;

/// Maximum lag drawn in the correlogram panels.
pub const MAX_CORRELOGRAM_LAGS: usize = 20;

/// Captions, axes and legends need a font backend. Without `ttf`
/// plotters cannot draw text, so charts carry only their series.
pub const DRAWS_TEXT: bool = cfg!(feature = "ttf");

const OBSERVED: RGBColor = RGBColor(31, 119, 180);
const MODEL: RGBColor = RGBColor(214, 39, 40);
const BAND: RGBColor = RGBColor(255, 127, 14);

/// Numeric x positions and axis label for an index.
fn axis(index: &SeriesIndex, origin: Option<DateTime<Utc>>) -> (Vec<f64>, &'static str) {
    let label = if index.is_time_based() {
        "seconds"
    } else {
        "index"
    };
    (index.axis_values(origin), label)
}

/// Chart builder with a caption and label areas when text is available.
fn chart_on<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    title: &str,
    title_size: u32,
    margin: u32,
    label_area: (u32, u32),
) -> ChartBuilder<'a, 'static, DB> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(margin);
    if DRAWS_TEXT {
        builder
            .caption(title, ("sans-serif", title_size).into_font())
            .x_label_area_size(label_area.0)
            .y_label_area_size(label_area.1);
    }
    builder
}

/// Observed series with the model's in-sample fitted values overlaid.
///
/// `fitted` is aligned with the end of `series`; it may be shorter when
/// the model differences the data.
pub fn plot_model_fit(ctx: &RenderContext, series: &TimeSeries, fitted: &[f64]) -> Result<()> {
    if fitted.len() > series.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: series.len(),
            got: fitted.len(),
        });
    }

    let (x, x_label) = axis(series.index(), None);
    let fitted_x = &x[x.len() - fitted.len()..];

    let root = ctx.root()?;
    let mut chart = chart_on(&root, "Model fit", 24, 15, (40, 60)).build_cartesian_2d(
        padded_range(&x),
        padded_range(series.values().iter().chain(fitted)),
    )?;
    if DRAWS_TEXT {
        chart.configure_mesh().x_desc(x_label).y_desc("value").draw()?;
    }

    chart
        .draw_series(LineSeries::new(
            x.iter().copied().zip(series.values().iter().copied()),
            OBSERVED.stroke_width(2),
        ))?
        .label("observed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], OBSERVED));
    chart
        .draw_series(LineSeries::new(
            fitted_x.iter().copied().zip(fitted.iter().copied()),
            MODEL.stroke_width(2),
        ))?
        .label("fitted")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MODEL));

    if DRAWS_TEXT {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    debug!(path = %ctx.path().display(), "wrote model fit plot");
    Ok(())
}

/// Two-by-two residual diagnostics: residuals over time, density
/// histogram, autocorrelation and partial autocorrelation.
///
/// `index` positions the residuals on the x axis and must have the same
/// length. Correlograms carry ±1.96/√n significance bands.
pub fn plot_residual_diagnostics(
    ctx: &RenderContext,
    index: &SeriesIndex,
    residuals: &[f64],
) -> Result<()> {
    if index.len() != residuals.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: index.len(),
            got: residuals.len(),
        });
    }
    if residuals.len() < 3 {
        return Err(ForecastError::InsufficientData {
            needed: 3,
            got: residuals.len(),
        });
    }

    let root = ctx.root()?;
    let panels = root.split_evenly((2, 2));
    let (x, x_label) = axis(index, None);
    let n = residuals.len();

    draw_residual_series(&panels[0], &x, x_label, residuals)?;
    draw_density_histogram(&panels[1], residuals)?;

    let acf_lags = MAX_CORRELOGRAM_LAGS.min(n - 1);
    let pacf_lags = MAX_CORRELOGRAM_LAGS.min(n / 2 - 1).max(1);
    draw_correlogram(&panels[2], "Residual ACF", &acf(residuals, acf_lags), n)?;
    draw_correlogram(&panels[3], "Residual PACF", &pacf(residuals, pacf_lags), n)?;

    root.present()?;
    debug!(path = %ctx.path().display(), "wrote residual diagnostics plot");
    Ok(())
}

fn draw_residual_series(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    x: &[f64],
    x_label: &str,
    residuals: &[f64],
) -> Result<()> {
    let x_range = padded_range(x);
    let mut chart = chart_on(area, "Residuals", 18, 10, (30, 50))
        .build_cartesian_2d(x_range.clone(), padded_range(residuals.iter().chain(&[0.0])))?;
    if DRAWS_TEXT {
        chart.configure_mesh().x_desc(x_label).draw()?;
    }

    chart.draw_series(LineSeries::new(
        [(x_range.start, 0.0), (x_range.end, 0.0)],
        BLACK.mix(0.5),
    ))?;
    chart.draw_series(LineSeries::new(
        x.iter().copied().zip(residuals.iter().copied()),
        OBSERVED,
    ))?;
    Ok(())
}

fn draw_density_histogram(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    residuals: &[f64],
) -> Result<()> {
    let values: Vec<f64> = residuals.iter().copied().filter(|v| v.is_finite()).collect();
    let bins = histogram_density(&values);
    let x_range = padded_range(bins.iter().flat_map(|(lo, hi, _)| [lo, hi]));
    let y_max = bins.iter().map(|(_, _, d)| *d).fold(0.0, f64::max);

    let mut chart = chart_on(area, "Residual density", 18, 10, (30, 50))
        .build_cartesian_2d(x_range, 0.0..(y_max * 1.1).max(f64::EPSILON))?;
    if DRAWS_TEXT {
        chart.configure_mesh().y_desc("density").draw()?;
    }

    chart.draw_series(
        bins.iter()
            .map(|&(lo, hi, d)| Rectangle::new([(lo, 0.0), (hi, d)], OBSERVED.mix(0.6).filled())),
    )?;
    Ok(())
}

/// Histogram bins `(left, right, density)` using Sturges' rule.
///
/// Densities integrate to one. A constant sample gets a single unit-wide bin.
pub(crate) fn histogram_density(values: &[f64]) -> Vec<(f64, f64, f64)> {
    if values.is_empty() {
        return Vec::new();
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let n = values.len() as f64;

    if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
        return vec![(lo - 0.5, lo + 0.5, 1.0)];
    }

    let count = (n.log2().ceil() as usize + 1).max(1);
    let width = (hi - lo) / count as f64;
    let mut counts = vec![0usize; count];
    for &v in values {
        let bin = (((v - lo) / width) as usize).min(count - 1);
        counts[bin] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let left = lo + i as f64 * width;
            (left, left + width, c as f64 / (n * width))
        })
        .collect()
}

fn draw_correlogram(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    coefficients: &[f64],
    n: usize,
) -> Result<()> {
    let max_lag = coefficients.len().saturating_sub(1) as f64;
    let band = 1.96 / (n as f64).sqrt();

    let mut chart = chart_on(area, title, 18, 10, (30, 50))
        .build_cartesian_2d(-0.5..max_lag + 0.5, -1.05..1.05)?;
    if DRAWS_TEXT {
        chart.configure_mesh().x_desc("lag").draw()?;
    }

    for level in [band, -band] {
        chart.draw_series(LineSeries::new(
            [(-0.5, level), (max_lag + 0.5, level)],
            BAND.stroke_width(1),
        ))?;
    }
    chart.draw_series(LineSeries::new(
        [(-0.5, 0.0), (max_lag + 0.5, 0.0)],
        BLACK.mix(0.5),
    ))?;

    let stems = coefficients
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_finite())
        .map(|(lag, &r)| (lag as f64, r));
    for (lag, r) in stems {
        chart.draw_series(iter::once(PathElement::new(
            vec![(lag, 0.0), (lag, r)],
            OBSERVED.stroke_width(2),
        )))?;
        chart.draw_series(iter::once(Circle::new((lag, r), 3, OBSERVED.filled())))?;
    }
    Ok(())
}

/// Observed series followed by the forecast mean and its interval band.
pub fn plot_forecast(
    ctx: &RenderContext,
    series: &TimeSeries,
    future: &SeriesIndex,
    forecast: &Forecast,
) -> Result<()> {
    if future.len() != forecast.horizon() {
        return Err(ForecastError::DimensionMismatch {
            expected: future.len(),
            got: forecast.horizon(),
        });
    }

    let origin = series.index().first_time();
    let (x, x_label) = axis(series.index(), origin);
    let (future_x, _) = axis(future, origin);
    let mean = forecast.mean();
    let interval = forecast.interval();

    let mut y_values: Vec<f64> = series.values().iter().chain(mean).copied().collect();
    if let Some(interval) = interval {
        y_values.extend(interval.lower().iter().chain(interval.upper()));
    }

    let root = ctx.root()?;
    let mut chart = chart_on(&root, "Forecast", 24, 15, (40, 60)).build_cartesian_2d(
        padded_range(x.iter().chain(&future_x)),
        padded_range(&y_values),
    )?;
    if DRAWS_TEXT {
        chart.configure_mesh().x_desc(x_label).y_desc("value").draw()?;
    }

    if let Some(interval) = interval {
        let band: Vec<(f64, f64)> = future_x
            .iter()
            .copied()
            .zip(interval.upper().iter().copied())
            .chain(
                future_x
                    .iter()
                    .copied()
                    .zip(interval.lower().iter().copied())
                    .rev(),
            )
            .collect();
        chart
            .draw_series(iter::once(Polygon::new(band, BAND.mix(0.25).filled())))?
            .label(format!("{:.0}% interval", interval.level() * 100.0))
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BAND.mix(0.25).filled()));
    }

    chart
        .draw_series(LineSeries::new(
            x.iter().copied().zip(series.values().iter().copied()),
            OBSERVED.stroke_width(2),
        ))?
        .label("observed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], OBSERVED));

    // Join the forecast to the last observation.
    let joined = x
        .last()
        .zip(series.values().last())
        .map(|(&x, &y)| (x, y))
        .into_iter()
        .chain(future_x.iter().copied().zip(mean.iter().copied()));
    chart
        .draw_series(LineSeries::new(joined, MODEL.stroke_width(2)))?
        .label("forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MODEL));

    if DRAWS_TEXT {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    debug!(path = %ctx.path().display(), horizon = forecast.horizon(), "wrote forecast plot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn histogram_density_integrates_to_one() {
        let values: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin()).collect();
        let bins = histogram_density(&values);

        // Sturges: ceil(log2 50) + 1 = 7
        assert_eq!(bins.len(), 7);
        let area: f64 = bins.iter().map(|(lo, hi, d)| (hi - lo) * d).sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn histogram_density_constant_sample() {
        assert_eq!(histogram_density(&[2.0; 4]), vec![(1.5, 2.5, 1.0)]);
        assert!(histogram_density(&[]).is_empty());
    }

    #[test]
    fn model_fit_plot_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RenderContext::new(dir.path().join("fit.png")).with_size(320, 240);
        let series = TimeSeries::from_values((0..20).map(|i| i as f64).collect());
        let fitted: Vec<f64> = (1..20).map(|i| i as f64 + 0.1).collect();

        plot_model_fit(&ctx, &series, &fitted).unwrap();
        assert!(std::fs::metadata(ctx.path()).unwrap().len() > 0);
    }

    #[test]
    fn all_charts_render_with_the_enabled_font_support() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = |name: &str| RenderContext::new(dir.path().join(name)).with_size(400, 300);
        let series = TimeSeries::from_values((0..30).map(|i| (i as f64 * 0.4).sin()).collect());
        let residuals: Vec<f64> = (0..30).map(|i| (i as f64 * 1.3).cos() * 0.2).collect();
        let forecast = Forecast::from_values_with_intervals(
            vec![0.5, 0.6, 0.7],
            vec![0.2, 0.2, 0.2],
            vec![0.8, 1.0, 1.2],
            0.95,
        )
        .unwrap();

        plot_model_fit(&ctx("fit.png"), &series, series.values()).unwrap();
        plot_residual_diagnostics(&ctx("res.png"), series.index(), &residuals).unwrap();
        plot_forecast(
            &ctx("fc.png"),
            &series,
            &SeriesIndex::Integer(vec![30, 31, 32]),
            &forecast,
        )
        .unwrap();

        for name in ["fit.png", "res.png", "fc.png"] {
            let bytes = std::fs::read(dir.path().join(name)).unwrap();
            assert_eq!(&bytes[..4], b"\x89PNG");
        }
    }

    #[test]
    fn residual_plot_checks_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RenderContext::new(dir.path().join("res.png"));
        let index = SeriesIndex::Integer((0..5).collect());

        let result = plot_residual_diagnostics(&ctx, &index, &[0.1, -0.2, 0.3]);
        assert!(matches!(result, Err(ForecastError::DimensionMismatch { .. })));
        assert!(!ctx.path().exists());
    }

    #[test]
    fn forecast_plot_checks_horizon() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RenderContext::new(dir.path().join("fc.png"));
        let series = TimeSeries::from_values(vec![1.0, 2.0, 3.0]);
        let future = SeriesIndex::Integer(vec![3, 4]);

        let result = plot_forecast(&ctx, &series, &future, &Forecast::from_values(vec![4.0]));
        assert!(matches!(result, Err(ForecastError::DimensionMismatch { .. })));
    }
}
