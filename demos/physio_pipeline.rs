//! Wearable-signal pipeline: rolling features, then an ARIMA fit on heart rate.
//!
//! Run with: cargo run --example physio_pipeline [output_dir]

use biosignal_features::prelude::*;
use chrono::{Duration, TimeZone, Utc};
use std::path::PathBuf;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    println!("=== Physiological Feature Pipeline ===\n");

    // 1. Ten minutes of 1 Hz wearable data
    let n = 600;
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap();
    let timestamps: Vec<_> = (0..n).map(|i| base + Duration::seconds(i as i64)).collect();

    let hr: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            72.0 + 0.02 * t + 4.0 * (t / 45.0).sin() + 1.5 * (t * 1.7).cos()
        })
        .collect();
    let eda: Vec<f64> = (0..n)
        .map(|i| 0.4 + 0.05 * (i as f64 / 80.0).sin() + if i > 300 { 0.1 } else { 0.0 })
        .collect();
    let activity: Vec<String> = (0..n)
        .map(|i| if i < 300 { "rest" } else { "walk" }.to_string())
        .collect();

    let table = SignalTable::builder()
        .timestamps(timestamps)
        .numeric("hr", hr)
        .numeric("eda", eda)
        .text("activity", activity)
        .build()?;

    // 2. Rolling features over a 60 s window
    let config = FeatureConfig::new(60);
    let features = extract_features(&table, &config)?;

    println!(
        "{} input rows -> {} feature rows, {} columns",
        table.len(),
        features.len(),
        features.num_columns()
    );
    println!("{:<16} {:>10} {:>10}", "Feature", "First", "Last");
    println!("{:-<38}", "");
    for (name, values) in features.columns() {
        if let (Some(first), Some(last)) = (values.first(), values.last()) {
            println!("{:<16} {:>10.4} {:>10.4}", name, first, last);
        }
    }

    // 3. The same table with warm-up trimming only
    let warm_up = config.with_trim_policy(TrimPolicy::WarmUpOnly);
    let lenient = extract_features(&table, &warm_up)?;
    println!("\nWarm-up-only trimming keeps {} rows", lenient.len());

    // 4. ARIMA on 10 s means of heart rate
    let hr = table.numeric("hr")?;
    let minute_means: Vec<f64> = hr
        .chunks(10)
        .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
        .collect();
    let stamps: Vec<_> = (0..minute_means.len())
        .map(|i| base + Duration::seconds(10 * i as i64))
        .collect();
    let series = TimeSeries::univariate(stamps, minute_means)?.with_name("hr");

    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("physio_pipeline_plots"));

    let fit_config = FitConfig::new((1, 1, 1))
        .with_output_dir(&output_dir)
        .with_horizon(12);
    let fitted = fit_arima_with_config(&series, &fit_config)?;
    let model = fitted.model();

    println!("\n--- {} ---", fitted.order());
    println!("AR coefficients: {:?}", model.ar_coefficients());
    println!("MA coefficients: {:?}", model.ma_coefficients());
    if let (Some(aic), Some(sigma2)) = (model.aic(), model.sigma2()) {
        println!("AIC: {:.3}  sigma^2: {:.4}", aic, sigma2);
    }
    let lb = fitted.ljung_box();
    println!(
        "Ljung-Box Q = {:.3} (lags {}, df {}), p = {:.4}",
        lb.statistic, lb.lags, lb.df, lb.p_value
    );

    let result = fitted.forecast_result();
    let forecast = &result.forecast;
    let lower = forecast.lower()?;
    let upper = forecast.upper()?;
    if let SeriesIndex::Time(times) = &result.index {
        println!("\n{:<22} {:>8} {:>8} {:>8}", "Time", "Mean", "Lower", "Upper");
        for (i, t) in times.iter().enumerate() {
            println!(
                "{:<22} {:>8.2} {:>8.2} {:>8.2}",
                t.format("%H:%M:%S"),
                forecast.mean()[i],
                lower[i],
                upper[i]
            );
        }
    }

    println!("\nPlots:");
    for path in fitted.artifacts().paths() {
        println!("  {}", path.display());
    }

    Ok(())
}
