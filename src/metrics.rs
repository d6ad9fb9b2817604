//! How well the moisture controller held each crop at its target.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaterError};

// Soil moisture band a crop is irrigated to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoistureTarget {
    pub crop: String,
    pub moisture_pct: f64,  // [%]
    pub tolerance_pct: f64, // Half-width of the band [%]
}

impl MoistureTarget {
    pub fn new(crop: &str, moisture_pct: f64, tolerance_pct: f64) -> Self {
        MoistureTarget {
            crop: crop.to_string(),
            moisture_pct,
            tolerance_pct,
        }
    }

    /// Bands used by the trial controller.
    pub fn trial_targets() -> Vec<MoistureTarget> {
        vec![
            MoistureTarget::new("Beans", 75.0, 10.0),
            MoistureTarget::new("Maize", 60.0, 5.0),
            MoistureTarget::new("Onion", 57.5, 7.5),
            MoistureTarget::new("Rice", 97.5, 2.5),
        ]
    }

    pub fn for_crop(crop: &str) -> Result<MoistureTarget> {
        Self::trial_targets()
            .into_iter()
            .find(|t| t.crop.eq_ignore_ascii_case(crop))
            .ok_or_else(|| WaterError::UnknownCrop(crop.to_string()))
    }
}

/// Share of readings [%] within `tolerance` of `target`, bounds included.
pub fn within_tolerance_pct(readings: &[f64], target: f64, tolerance: f64) -> Option<f64> {
    if readings.is_empty() {
        return None;
    }
    let inside = readings
        .iter()
        .filter(|r| (*r - target).abs() <= tolerance)
        .count();
    Some(inside as f64 / readings.len() as f64 * 100.0)
}

// Mean absolute error against a constant target
pub fn mae(readings: &[f64], target: f64) -> Option<f64> {
    mean(readings.iter().map(|r| (r - target).abs()), readings.len())
}

// Mean squared error against a constant target
pub fn mse(readings: &[f64], target: f64) -> Option<f64> {
    mean(readings.iter().map(|r| (r - target).powi(2)), readings.len())
}

pub fn rmse(readings: &[f64], target: f64) -> Option<f64> {
    mse(readings, target).map(f64::sqrt)
}

fn mean(values: impl Iterator<Item = f64>, n: usize) -> Option<f64> {
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

/// Sample indices of the local maxima of a series, each one an irrigation
/// event seen by the moisture sensor.
///
/// A flat top counts once, at its middle sample. Endpoints are never peaks.
pub fn adjustment_peaks(readings: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    let mut i = 1;
    while i + 1 < readings.len() {
        if readings[i - 1] < readings[i] {
            // Walk over a plateau
            let mut end = i;
            while end + 1 < readings.len() && readings[end + 1] == readings[i] {
                end += 1;
            }
            if end + 1 < readings.len() && readings[end + 1] < readings[i] {
                peaks.push((i + end) / 2);
            }
            i = end + 1;
        } else {
            i += 1;
        }
    }
    peaks
}

// Control performance of one crop over a series of moisture readings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlPerformance {
    pub crop: String,
    pub samples: usize,
    pub within_tolerance_pct: f64, // Time inside the band [%]
    pub mae: f64,                  // [%]
    pub mse: f64,                  // [%²]
    pub rmse: f64,                 // [%]
    pub adjustments: usize,        // Irrigation events
    pub mean_response_samples: Option<f64>, // Mean spacing of events, with at least two events
}

/**
Scores a moisture series against a crop's band.

Returns `None` for an empty series.
*/
pub fn evaluate_control(readings: &[f64], target: &MoistureTarget) -> Option<ControlPerformance> {
    let mse = mse(readings, target.moisture_pct)?;
    let peaks = adjustment_peaks(readings);
    let mean_response_samples = if peaks.len() >= 2 {
        Some((peaks[peaks.len() - 1] - peaks[0]) as f64 / (peaks.len() - 1) as f64)
    } else {
        None
    };
    Some(ControlPerformance {
        crop: target.crop.clone(),
        samples: readings.len(),
        within_tolerance_pct: within_tolerance_pct(
            readings,
            target.moisture_pct,
            target.tolerance_pct,
        )?,
        mae: mae(readings, target.moisture_pct)?,
        mse,
        rmse: mse.sqrt(),
        adjustments: peaks.len(),
        mean_response_samples,
    })
}
