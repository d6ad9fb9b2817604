use serde::{Deserialize, Serialize};

use crate::error::{Result, WaterError};

pub const INITIAL: &str = "Initial";
pub const DEVELOPMENT: &str = "Development";
pub const MID_SEASON: &str = "Mid-Season";
pub const LATE_SEASON: &str = "Late-Season";

const DAYS_PER_MONTH: f64 = 30.0;

// Extra daily water demand of flooded crops (rice), on top of crop evapotranspiration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalTerms {
    #[serde(rename = "sat")]
    pub saturation_monthly: f64, // Soil saturation at transplanting [mm/month]
    #[serde(rename = "parc")]
    pub percolation_daily: f64, // Percolation loss [mm/day]
    #[serde(rename = "wl")]
    pub water_layer_monthly: f64, // Standing water layer maintenance [mm/month]
}

impl AdditionalTerms {
    pub fn new(saturation_monthly: f64, percolation_daily: f64, water_layer_monthly: f64) -> Self {
        AdditionalTerms {
            saturation_monthly,
            percolation_daily,
            water_layer_monthly,
        }
    }

    // Sum of the terms as a daily rate [mm/day]
    pub fn daily_total(&self) -> f64 {
        self.saturation_monthly / DAYS_PER_MONTH
            + self.percolation_daily
            + self.water_layer_monthly / DAYS_PER_MONTH
    }
}

// Coefficient label of a growth stage: Ki, Kd, Km, Kl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoefficientType {
    Initial,
    Development,
    MidSeason,
    LateSeason,
    Other,
}

impl CoefficientType {
    pub fn from_stage_name(name: &str) -> Self {
        match name {
            INITIAL => CoefficientType::Initial,
            DEVELOPMENT => CoefficientType::Development,
            MID_SEASON => CoefficientType::MidSeason,
            LATE_SEASON => CoefficientType::LateSeason,
            _ => CoefficientType::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CoefficientType::Initial => "Ki",
            CoefficientType::Development => "Kd",
            CoefficientType::MidSeason => "Km",
            CoefficientType::LateSeason => "Kl",
            CoefficientType::Other => "",
        }
    }
}

// A named phase of the crop lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthStage {
    pub name: String,
    #[serde(rename = "kc")]
    pub coefficient: f64, // Crop coefficient Kc [-]
    #[serde(rename = "days")]
    pub duration_days: u32, // Nominal stage length [day]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional: Option<AdditionalTerms>,
}

impl GrowthStage {
    pub fn new(name: &str, coefficient: f64, duration_days: u32) -> Self {
        GrowthStage {
            name: name.to_string(),
            coefficient,
            duration_days,
            additional: None,
        }
    }

    pub fn with_additional(mut self, terms: AdditionalTerms) -> Self {
        self.additional = Some(terms);
        self
    }

    pub fn coefficient_type(&self) -> CoefficientType {
        CoefficientType::from_stage_name(&self.name)
    }
}

/// Ordered growth stages of one crop.
///
/// Stage order is meaningful: stages are consumed in sequence when mapping
/// elapsed days to the current stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropStageTable {
    #[serde(rename = "name")]
    pub crop: String,
    #[serde(rename = "stage")]
    pub stages: Vec<GrowthStage>,
}

impl CropStageTable {
    pub fn new(crop: &str, stages: Vec<GrowthStage>) -> Self {
        CropStageTable {
            crop: crop.to_string(),
            stages,
        }
    }

    // Reject negative or non-finite coefficients and extra terms, and a
    // lifecycle longer than u32::MAX days
    pub fn validate(&self) -> Result<()> {
        let mut lifecycle: u32 = 0;
        for stage in &self.stages {
            let invalid = |reason: String| WaterError::InvalidStage {
                crop: self.crop.clone(),
                stage: stage.name.clone(),
                reason,
            };
            if !stage.coefficient.is_finite() || stage.coefficient < 0.0 {
                return Err(invalid(format!(
                    "crop coefficient must be a non-negative number, got {}",
                    stage.coefficient
                )));
            }
            if let Some(terms) = &stage.additional {
                let values = [
                    terms.saturation_monthly,
                    terms.percolation_daily,
                    terms.water_layer_monthly,
                ];
                if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(invalid(format!(
                        "additional terms must be non-negative numbers, got {:?}",
                        terms
                    )));
                }
            }
            lifecycle = lifecycle.checked_add(stage.duration_days).ok_or_else(|| {
                invalid(format!(
                    "lifecycle exceeds {} days after adding {} days",
                    u32::MAX,
                    stage.duration_days
                ))
            })?;
        }
        Ok(())
    }

    pub fn stage(&self, name: &str) -> Option<&GrowthStage> {
        self.stages.iter().find(|s| s.name == name)
    }

    // Full nominal lifecycle length [day]
    pub fn total_days(&self) -> u32 {
        self.stages
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.duration_days))
    }

    /// Stage in progress on a given elapsed day (0-based), `None` after the last stage.
    pub fn stage_at_day(&self, day: u32) -> Option<&GrowthStage> {
        let mut end: u32 = 0;
        for stage in &self.stages {
            end = end.saturating_add(stage.duration_days);
            if day < end {
                return Some(stage);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rice_with_empty_development() -> CropStageTable {
        CropStageTable::new(
            "Rice",
            vec![
                GrowthStage::new(INITIAL, 1.1, 60)
                    .with_additional(AdditionalTerms::new(60.0, 6.0, 10.0)),
                GrowthStage::new(DEVELOPMENT, 0.0, 0),
                GrowthStage::new(MID_SEASON, 1.2, 60)
                    .with_additional(AdditionalTerms::new(0.0, 6.0, 10.0)),
                GrowthStage::new(LATE_SEASON, 1.0, 30)
                    .with_additional(AdditionalTerms::new(0.0, 6.0, 10.0)),
            ],
        )
    }

    #[test]
    fn additional_terms_daily_total() {
        let terms = AdditionalTerms::new(60.0, 6.0, 10.0);
        assert_abs_diff_eq!(terms.daily_total(), 2.0 + 6.0 + 10.0 / 30.0, epsilon = 1e-12);
        assert_eq!(AdditionalTerms::default().daily_total(), 0.0);
    }

    #[test]
    fn coefficient_labels() {
        let table = rice_with_empty_development();
        let labels: Vec<_> = table
            .stages
            .iter()
            .map(|s| s.coefficient_type().label())
            .collect();
        assert_eq!(labels, vec!["Ki", "Kd", "Km", "Kl"]);
        assert_eq!(CoefficientType::from_stage_name("Nursery").label(), "");
    }

    #[test]
    fn stage_at_day_skips_empty_stages() {
        let table = rice_with_empty_development();
        assert_eq!(table.total_days(), 150);
        assert_eq!(table.stage_at_day(0).map(|s| s.name.as_str()), Some(INITIAL));
        assert_eq!(table.stage_at_day(59).map(|s| s.name.as_str()), Some(INITIAL));
        assert_eq!(table.stage_at_day(60).map(|s| s.name.as_str()), Some(MID_SEASON));
        assert_eq!(table.stage_at_day(149).map(|s| s.name.as_str()), Some(LATE_SEASON));
        assert!(table.stage_at_day(150).is_none());
    }

    #[test]
    fn validate_rejects_negative_coefficient() {
        let mut table = rice_with_empty_development();
        assert!(table.validate().is_ok());

        table.stages[2].coefficient = -0.1;
        let err = table.validate().unwrap_err();
        assert!(matches!(err, WaterError::InvalidStage { ref stage, .. } if stage == MID_SEASON));
    }

    #[test]
    fn overlong_lifecycle_saturates() {
        let table = CropStageTable::new(
            "Teak",
            vec![
                GrowthStage::new(INITIAL, 0.5, u32::MAX),
                GrowthStage::new(DEVELOPMENT, 0.7, 10),
            ],
        );
        assert_eq!(table.total_days(), u32::MAX);
        assert_eq!(
            table.stage_at_day(u32::MAX - 1).map(|s| s.name.as_str()),
            Some(INITIAL)
        );
        assert!(table.stage_at_day(u32::MAX).is_none());

        let err = table.validate().unwrap_err();
        assert!(matches!(err, WaterError::InvalidStage { ref stage, .. } if stage == DEVELOPMENT));
    }

    #[test]
    fn validate_rejects_negative_terms() {
        let mut table = rice_with_empty_development();
        table.stages[0].additional = Some(AdditionalTerms::new(-1.0, 6.0, 10.0));
        assert!(table.validate().is_err());
    }
}
