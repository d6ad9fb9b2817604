mod analysis;
mod config;
mod crops;
mod drip;
mod error;
mod eto;
mod intercrop;
mod metrics;
mod stage;
mod water;
mod window;

pub use analysis::{
    Analysis, CropAnalysis, ResolvedEto, compare_sources, resolve_eto, run_analysis,
    unmatched_windows,
};
pub use config::{AnalysisConfig, EtoSource, LocationParams};
pub use crops::CropLibrary;
pub use drip::{
    DripDesign, DripDesignInput, apply_drip_savings, design_drip_system, water_savings_for_head,
};
pub use error::{Result, WaterError};
pub use eto::{
    EnvironmentalReading, EtoMethod, LocationEto, compute_eto, is_within_typical_range,
    location_eto, seasonal_factor,
};
pub use intercrop::{
    CalibratedPair, EVEN_RATIO, InteractionFactors, IntercropModel, StageWater, SystemWater,
    interaction_factor, intercrop_water, savings_vs_monoculture,
};
pub use metrics::{
    ControlPerformance, MoistureTarget, adjustment_peaks, evaluate_control, mae, mse, rmse,
    within_tolerance_pct,
};
pub use stage::{
    AdditionalTerms, CoefficientType, CropStageTable, DEVELOPMENT, GrowthStage, INITIAL,
    LATE_SEASON, MID_SEASON,
};
pub use water::{CropWaterResults, StageWaterResult, compute_crop_results, compute_stage_water};
pub use window::{ObservationWindow, WindowWater, aggregate};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn it_works() {
        let library = CropLibrary::builtin().unwrap();
        let analysis = run_analysis(&AnalysisConfig::default(), &library).unwrap();

        for crop in &analysis.crops {
            let table = library.get(crop.crop()).unwrap();
            assert_eq!(crop.window.total_days(), 37);

            // Charging a full initial stage reproduces the stage total
            let initial = table.stage(INITIAL).unwrap();
            let full = aggregate(
                &crop.results,
                ObservationWindow::new(initial.duration_days, 0),
            )
            .unwrap();
            assert_eq!(full.initial_water, crop.results.stage(INITIAL).unwrap().total_water);
        }

        let windows: Vec<_> = analysis
            .crops
            .iter()
            .map(|c| (c.crop(), c.window.initial_days, c.window.development_days))
            .collect();
        assert_eq!(
            windows,
            vec![
                ("Onion", 15, 22),
                ("Beans", 15, 22),
                ("Maize", 20, 17),
                ("Rice", 37, 0)
            ]
        );

        let onion = analysis.crop("Onion").unwrap();
        assert_relative_eq!(
            onion.window_water.total_water,
            6.5 * 0.36 * (0.5 * 15.0 + 0.7 * 22.0),
            max_relative = 1e-12
        );
    }
}
