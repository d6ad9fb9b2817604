//! Crop water analysis over a trial: resolves ETo, evaluates every crop table
//! and aggregates its observation window.
//!
//! This is the reporting layer of the crate. The calculators only return
//! advisory flags; they are turned into log events here.

use serde::Serialize;

use crate::config::{AnalysisConfig, EtoSource};
use crate::crops::CropLibrary;
use crate::error::Result;
use crate::eto::{EtoMethod, location_eto};
use crate::water::{CropWaterResults, compute_crop_results};
use crate::window::{ObservationWindow, WindowWater, aggregate};

// ETo value chosen for an analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEto {
    pub value: f64, // [mm/day]
    pub method: EtoMethod,
    pub source: &'static str,
    pub description: String,
    pub within_typical_range: Option<bool>, // Only known for location sources
}

pub fn resolve_eto(source: &EtoSource) -> ResolvedEto {
    match source {
        EtoSource::Fixed { value } | EtoSource::Custom { value } => {
            let value = *value;
            ResolvedEto {
                value,
                method: EtoMethod::Fixed,
                source: source.name(),
                description: format!("{} ETo = {:.2} mm/day", source.name(), value),
                within_typical_range: None,
            }
        }
        EtoSource::Location(params) => {
            let reading = params.reading();
            let eto = location_eto(&reading, params.month);
            let validity = if eto.within_typical_range {
                "within typical range"
            } else {
                "outside typical range"
            };
            ResolvedEto {
                value: eto.eto,
                method: EtoMethod::Calculated,
                source: source.name(),
                description: format!(
                    "location ETo = {:.2} mm/day (T={}°C, RH={}%, elev={}m, month={}, seasonal factor {}) - {}",
                    eto.eto,
                    params.temperature_c,
                    params.relative_humidity_pct,
                    params.elevation_m,
                    params.month,
                    eto.seasonal_factor,
                    validity
                ),
                within_typical_range: Some(eto.within_typical_range),
            }
        }
    }
}

// Results of one crop within an analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropAnalysis {
    pub results: CropWaterResults,
    pub window: ObservationWindow,
    pub window_water: WindowWater,
}

impl CropAnalysis {
    pub fn crop(&self) -> &str {
        &self.results.crop
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub eto: ResolvedEto,
    pub area_m2: f64,
    pub crops: Vec<CropAnalysis>,
}

impl Analysis {
    pub fn crop(&self, name: &str) -> Option<&CropAnalysis> {
        self.crops
            .iter()
            .find(|c| c.crop().eq_ignore_ascii_case(name))
    }
}

/**
Runs the water analysis for every crop of a library.

Each crop's observation window comes from `config.windows` when present,
otherwise it is derived from `config.trial_days`.

# Errors
Invalid configuration, or a crop table without an initial stage.
*/
pub fn run_analysis(config: &AnalysisConfig, library: &CropLibrary) -> Result<Analysis> {
    config.validate()?;

    let eto = resolve_eto(&config.eto);
    tracing::info!("Using {}", eto.description);
    if eto.within_typical_range == Some(false) {
        tracing::warn!(
            "Location conditions are outside the typical climate envelope, ETo = {:.2} mm/day is an extrapolation",
            eto.value
        );
    }

    for crop in unmatched_windows(config, library) {
        tracing::warn!("Observation window for unknown crop '{}' is ignored", crop);
    }

    let mut crops = Vec::with_capacity(library.len());
    for table in library.iter() {
        let results = compute_crop_results(table, eto.value, config.area_m2);
        let window = config
            .window_for(&table.crop)
            .unwrap_or_else(|| ObservationWindow::from_trial_days(table, config.trial_days));
        let window_water = aggregate(&results, window)?;

        if window_water.development_stage_missing {
            tracing::info!(
                "{} has no development stage, {} development days not charged",
                table.crop,
                window.development_days
            );
        }
        tracing::debug!(
            "{}: initial {} days = {:.3}, development {} days = {:.3}, total = {:.3}",
            table.crop,
            window.initial_days,
            window_water.initial_water,
            window.development_days,
            window_water.development_water,
            window_water.total_water
        );

        crops.push(CropAnalysis {
            results,
            window,
            window_water,
        });
    }

    Ok(Analysis {
        eto,
        area_m2: config.area_m2,
        crops,
    })
}

/// Configured window names that match no crop of the library.
pub fn unmatched_windows<'a>(config: &'a AnalysisConfig, library: &CropLibrary) -> Vec<&'a str> {
    config
        .windows
        .keys()
        .filter(|name| library.get(name).is_err())
        .map(String::as_str)
        .collect()
}

/// Runs the same analysis once per ETo source.
pub fn compare_sources(
    config: &AnalysisConfig,
    library: &CropLibrary,
    sources: &[EtoSource],
) -> Result<Vec<Analysis>> {
    sources
        .iter()
        .map(|source| run_analysis(&config.clone().with_eto(*source), library))
        .collect()
}
