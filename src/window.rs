//! Water required over a field trial shorter than the crop lifecycle.
//!
//! A trial window covers the initial stage and possibly part of the
//! development stage; each is charged at its stage's daily rate for the days
//! actually observed rather than the nominal stage length.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaterError};
use crate::stage::{CropStageTable, DEVELOPMENT, INITIAL};
use crate::water::CropWaterResults;

// Days of a trial spent in each early growth stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationWindow {
    #[serde(rename = "initial")]
    pub initial_days: u32,
    #[serde(rename = "development", default)]
    pub development_days: u32,
}

impl ObservationWindow {
    pub fn new(initial_days: u32, development_days: u32) -> Self {
        ObservationWindow {
            initial_days,
            development_days,
        }
    }

    /// Splits a trial length over the initial and development stages of a table.
    ///
    /// Days past the end of the development stage are not counted. A crop
    /// without a development stage spends the whole trial in its initial stage.
    pub fn from_trial_days(table: &CropStageTable, trial_days: u32) -> Self {
        let development = table.stage(DEVELOPMENT).map(|s| s.duration_days).unwrap_or(0);
        if development == 0 {
            return ObservationWindow::new(trial_days, 0);
        }
        let initial = table.stage(INITIAL).map(|s| s.duration_days).unwrap_or(0);
        let initial_days = trial_days.min(initial);
        let development_days = (trial_days - initial_days).min(development);
        ObservationWindow::new(initial_days, development_days)
    }

    pub fn total_days(&self) -> u32 {
        self.initial_days.saturating_add(self.development_days)
    }
}

// Water required during an observation window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowWater {
    pub initial_water: f64,                   // [mm·m²]
    pub development_water: f64,               // [mm·m²]
    pub total_water: f64,                     // [mm·m²]
    pub initial_coefficient: f64,             // Ki used
    pub development_coefficient: Option<f64>, // Kd used, if any development days were charged
    pub development_stage_missing: bool,      // Development days requested but no such stage
}

/**
Aggregates stage daily rates over an observation window.

The initial stage is required; a crop table without one is malformed. When
`development_days` is zero the development stage is never looked up. When it
is positive but the crop has no development stage (rice), the development
share is zero and `development_stage_missing` is set for the caller to report.

# Errors
[`WaterError::MissingStage`] if the results have no initial stage.
*/
pub fn aggregate(results: &CropWaterResults, window: ObservationWindow) -> Result<WindowWater> {
    let initial = results
        .stage(INITIAL)
        .ok_or_else(|| WaterError::MissingStage {
            crop: results.crop.clone(),
            stage: INITIAL.to_string(),
        })?;
    let initial_water = initial.daily_water * f64::from(window.initial_days);

    let mut development_water = 0.0;
    let mut development_coefficient = None;
    let mut development_stage_missing = false;
    if window.development_days > 0 {
        match results.stage(DEVELOPMENT) {
            Some(development) => {
                development_water = development.daily_water * f64::from(window.development_days);
                development_coefficient = Some(development.coefficient);
            }
            None => development_stage_missing = true,
        }
    }

    Ok(WindowWater {
        initial_water,
        development_water,
        total_water: initial_water + development_water,
        initial_coefficient: initial.coefficient,
        development_coefficient,
        development_stage_missing,
    })
}
