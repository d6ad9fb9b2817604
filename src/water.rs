//! Crop water volumes per growth stage.
//!
//! Depth times area gives volume: 1 mm of water over 1 m² is 1 litre, so with
//! the area in m² every daily and total figure below reads in litres.

use serde::Serialize;

use crate::stage::{CoefficientType, CropStageTable, GrowthStage};

// Water requirement of one growth stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageWaterResult {
    pub stage_name: String,
    pub coefficient_type: CoefficientType,
    pub coefficient: f64, // Kc [-]
    pub daily_water: f64, // Daily volume, extra terms included [mm·m²]
    pub total_water: f64, // daily_water * days_used [mm·m²]
    pub days_used: u32,   // Stage length [day]
    pub applicable: bool, // False for zero-length stages
}

impl StageWaterResult {
    pub fn coefficient_label(&self) -> &'static str {
        self.coefficient_type.label()
    }
}

/**
Calculates the daily and total water volume of one growth stage.

Crop evapotranspiration over the full stage (`eto * kc * days`) is spread over
the cultivated area and divided back into a daily rate, to which the stage's
additional terms are added. The total is re-derived from that daily rate.

A stage with zero days is not applicable: it yields zero daily and total water.

# Arguments
* `eto` - Reference evapotranspiration [mm/day].
* `stage` - Growth stage with its Kc and duration.
* `area_m2` - Cultivated area [m²].
*/
pub fn compute_stage_water(eto: f64, stage: &GrowthStage, area_m2: f64) -> StageWaterResult {
    let days = stage.duration_days;
    let (daily_water, total_water) = if days == 0 {
        (0.0, 0.0)
    } else {
        let days_f = f64::from(days);
        let et_crop_total = eto * stage.coefficient * days_f; // [mm]
        let volume_total = et_crop_total * area_m2; // [mm·m²]
        let mut daily = volume_total / days_f;
        if let Some(terms) = &stage.additional {
            daily += terms.daily_total();
        }
        (daily, daily * days_f)
    };

    StageWaterResult {
        stage_name: stage.name.clone(),
        coefficient_type: stage.coefficient_type(),
        coefficient: stage.coefficient,
        daily_water,
        total_water,
        days_used: days,
        applicable: days > 0,
    }
}

// Stage results of one crop, in table order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropWaterResults {
    pub crop: String,
    pub eto: f64,     // [mm/day]
    pub area_m2: f64, // [m²]
    pub stages: Vec<StageWaterResult>,
}

impl CropWaterResults {
    pub fn stage(&self, name: &str) -> Option<&StageWaterResult> {
        self.stages.iter().find(|r| r.stage_name == name)
    }

    // Water over the full nominal lifecycle [mm·m²]
    pub fn total_water(&self) -> f64 {
        self.stages.iter().map(|r| r.total_water).sum()
    }
}

pub fn compute_crop_results(table: &CropStageTable, eto: f64, area_m2: f64) -> CropWaterResults {
    CropWaterResults {
        crop: table.crop.clone(),
        eto,
        area_m2,
        stages: table
            .stages
            .iter()
            .map(|stage| compute_stage_water(eto, stage, area_m2))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{AdditionalTerms, DEVELOPMENT, INITIAL};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const ETO: f64 = 6.5;
    const AREA: f64 = 0.36;

    #[test]
    fn maize_initial_stage() {
        let stage = GrowthStage::new(INITIAL, 0.4, 20);
        let result = compute_stage_water(ETO, &stage, AREA);
        assert_relative_eq!(result.daily_water, 0.936, max_relative = 1e-12);
        assert_relative_eq!(result.total_water, 18.72, max_relative = 1e-12);
        assert_eq!(result.days_used, 20);
        assert_eq!(result.coefficient_label(), "Ki");
        assert!(result.applicable);
    }

    #[test]
    fn total_is_daily_times_days() {
        for (kc, days) in [(0.35, 15), (0.7, 25), (1.05, 70), (0.3, 20), (1.15, 1)] {
            let stage = GrowthStage::new("Stage", kc, days);
            let result = compute_stage_water(ETO, &stage, AREA);
            assert_eq!(result.total_water, result.daily_water * f64::from(days));
            assert_relative_eq!(result.daily_water, ETO * kc * AREA, max_relative = 1e-12);
        }
    }

    #[test]
    fn rice_initial_with_additional_terms() {
        let stage = GrowthStage::new(INITIAL, 1.1, 60)
            .with_additional(AdditionalTerms::new(60.0, 6.0, 10.0));
        let result = compute_stage_water(ETO, &stage, AREA);
        // 2.574 + 2 + 6 + 0.333
        assert_abs_diff_eq!(result.daily_water, 10.907, epsilon = 1e-3);
        assert_abs_diff_eq!(result.total_water, 654.42, epsilon = 0.03);
        assert_eq!(result.total_water, result.daily_water * 60.0);
    }

    #[test]
    fn zero_duration_stage_contributes_nothing() {
        let stage = GrowthStage::new(DEVELOPMENT, 0.0, 0)
            .with_additional(AdditionalTerms::new(0.0, 6.0, 10.0));
        let result = compute_stage_water(ETO, &stage, AREA);
        assert_eq!(result.daily_water, 0.0);
        assert_eq!(result.total_water, 0.0);
        assert!(!result.applicable);
    }

    #[test]
    fn crop_results_keep_table_order() {
        let table = CropStageTable::new(
            "Maize",
            vec![
                GrowthStage::new(INITIAL, 0.4, 20),
                GrowthStage::new(DEVELOPMENT, 0.8, 35),
            ],
        );
        let results = compute_crop_results(&table, ETO, AREA);
        assert_eq!(results.stages.len(), 2);
        assert_eq!(results.stages[1].stage_name, DEVELOPMENT);
        assert!(results.stage(INITIAL).is_some());
        let expected = ETO * AREA * (0.4 * 20.0 + 0.8 * 35.0);
        assert_relative_eq!(results.total_water(), expected, max_relative = 1e-12);
    }
}
