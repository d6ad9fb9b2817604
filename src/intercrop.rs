//! Water of two crops grown together, calibrated on the measured trials.
//!
//! Each measured intercrop gives one interaction factor per stage window: the
//! ratio between the intercrop's water and the planting-weighted mean of its
//! two monocultures. Combinations that were never measured are predicted with
//! each crop's factors averaged over the measured pairs it appears in.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::drip::{apply_drip_savings, water_savings_for_head};
use crate::error::{Result, WaterError};

// Controller measurements of the 37-day trials
const FIELD_TRIAL: &str = include_str!("../intercrop_trial.toml");

/// Even planting of both crops.
pub const EVEN_RATIO: (f64, f64) = (0.5, 0.5);

// Water applied over the initial and development observation windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageWater {
    pub initial: f64,     // [mm]
    pub development: f64, // [mm]
}

impl StageWater {
    pub fn new(initial: f64, development: f64) -> Self {
        StageWater {
            initial,
            development,
        }
    }

    pub fn total(&self) -> f64 {
        self.initial + self.development
    }
}

// Intercrop over monoculture water ratio, per stage window [-]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InteractionFactors {
    pub initial: f64,
    pub development: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibratedPair {
    pub crops: [String; 2],
    pub measured: StageWater,
    pub factors: InteractionFactors,
}

impl CalibratedPair {
    fn involves(&self, crop: &str) -> bool {
        self.crops.iter().any(|c| c.eq_ignore_ascii_case(crop))
    }

    fn is_pair(&self, crop1: &str, crop2: &str) -> bool {
        let [a, b] = &self.crops;
        (a.eq_ignore_ascii_case(crop1) && b.eq_ignore_ascii_case(crop2))
            || (a.eq_ignore_ascii_case(crop2) && b.eq_ignore_ascii_case(crop1))
    }
}

// Water of a cropping system and its savings [%]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemWater {
    pub water: StageWater,
    pub total: f64,                  // [mm]
    pub savings_pct: f64,            // Against the monoculture baseline
    pub additional_savings_pct: f64, // Against the same system under standard irrigation
}

#[derive(Deserialize)]
struct MeasuredPair {
    crops: [String; 2],
    initial: f64,
    development: f64,
}

#[derive(Deserialize)]
struct IntercropTrialFile {
    monoculture: BTreeMap<String, StageWater>,
    #[serde(rename = "pair", default)]
    pairs: Vec<MeasuredPair>,
}

/**
Factor that scales the even mean of two monocultures onto a measured intercrop.

`factor = 2 · target / (mono1 + mono2)`, the same factor being given to both
crops. Stage windows where neither monoculture used water get a neutral 1.
*/
pub fn interaction_factor(mono1: f64, mono2: f64, target: f64) -> f64 {
    let sum = mono1 + mono2;
    if sum <= 0.0 {
        return 1.0;
    }
    2.0 * target / sum
}

// Shares of each crop, normalised to sum to one
fn planting_shares(ratio: (f64, f64)) -> Result<(f64, f64)> {
    let (a, b) = ratio;
    let valid = a.is_finite() && b.is_finite() && a >= 0.0 && b >= 0.0 && a + b > 0.0;
    if !valid {
        return Err(WaterError::InvalidRatio(a, b));
    }
    Ok((a / (a + b), b / (a + b)))
}

/// Intercrop water: each monoculture weighted by its planting share and scaled
/// by its interaction factors.
pub fn intercrop_water(
    mono: (StageWater, StageWater),
    factors: (InteractionFactors, InteractionFactors),
    ratio: (f64, f64),
) -> Result<StageWater> {
    let (w1, w2) = planting_shares(ratio)?;
    let (m1, m2) = mono;
    let (f1, f2) = factors;
    Ok(StageWater::new(
        w1 * m1.initial * f1.initial + w2 * m2.initial * f2.initial,
        w1 * m1.development * f1.development + w2 * m2.development * f2.development,
    ))
}

/// Savings [%] of an intercrop total against the planting-weighted monoculture mean.
///
/// Zero when the monocultures used no water.
pub fn savings_vs_monoculture(
    total: f64,
    mono_totals: (f64, f64),
    ratio: (f64, f64),
) -> Result<f64> {
    let (w1, w2) = planting_shares(ratio)?;
    let baseline = w1 * mono_totals.0 + w2 * mono_totals.1;
    if baseline <= 0.0 {
        return Ok(0.0);
    }
    Ok((1.0 - total / baseline) * 100.0)
}

/// Monoculture measurements and the interaction factors calibrated on the
/// measured intercrops.
#[derive(Debug, Clone, PartialEq)]
pub struct IntercropModel {
    monoculture: BTreeMap<String, StageWater>,
    pairs: Vec<CalibratedPair>,
}

impl IntercropModel {
    /**
    Calibrates one pair of interaction factors per measured intercrop.

    # Errors
    [`WaterError::UnknownCrop`] when a measured pair names a crop without a
    monoculture measurement.
    */
    pub fn new(
        monoculture: BTreeMap<String, StageWater>,
        measured: Vec<([String; 2], StageWater)>,
    ) -> Result<Self> {
        let mut model = IntercropModel {
            monoculture,
            pairs: Vec::with_capacity(measured.len()),
        };
        for (crops, target) in measured {
            let m1 = *model.monoculture(&crops[0])?;
            let m2 = *model.monoculture(&crops[1])?;
            let factors = InteractionFactors {
                initial: interaction_factor(m1.initial, m2.initial, target.initial),
                development: interaction_factor(m1.development, m2.development, target.development),
            };
            model.pairs.push(CalibratedPair {
                crops,
                measured: target,
                factors,
            });
        }
        Ok(model)
    }

    /// Onion, beans, maize and rice monocultures with the maize-beans,
    /// onion-beans and maize-onion intercrops.
    pub fn field_trial() -> Result<Self> {
        Self::from_toml_str(FIELD_TRIAL)
    }

    // Parse a `[monoculture]` table and `[[pair]]` measurements
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let file: IntercropTrialFile = toml::from_str(toml_str)?;
        let measured = file
            .pairs
            .into_iter()
            .map(|p| (p.crops, StageWater::new(p.initial, p.development)))
            .collect();
        Self::new(file.monoculture, measured)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading intercrop measurements from {}", path.display());
        let toml_str = fs::read_to_string(path).map_err(|source| WaterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&toml_str)
    }

    // Case-insensitive lookup of a monoculture measurement
    pub fn monoculture(&self, crop: &str) -> Result<&StageWater> {
        self.monoculture
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(crop))
            .map(|(_, water)| water)
            .ok_or_else(|| WaterError::UnknownCrop(crop.to_string()))
    }

    pub fn pairs(&self) -> &[CalibratedPair] {
        &self.pairs
    }

    // Factors of a crop averaged over every measured pair it appears in
    fn averaged_factors(&self, crop: &str) -> Result<InteractionFactors> {
        let matching: Vec<_> = self.pairs.iter().filter(|p| p.involves(crop)).collect();
        if matching.is_empty() {
            return Err(WaterError::NoInteractionData(crop.to_string()));
        }
        let n = matching.len() as f64;
        Ok(InteractionFactors {
            initial: matching.iter().map(|p| p.factors.initial).sum::<f64>() / n,
            development: matching.iter().map(|p| p.factors.development).sum::<f64>() / n,
        })
    }

    /// Interaction factors of `crop1` and `crop2`, calibrated when the pair was
    /// measured in either order, averaged per crop otherwise.
    pub fn factors(
        &self,
        crop1: &str,
        crop2: &str,
    ) -> Result<(InteractionFactors, InteractionFactors)> {
        self.monoculture(crop1)?;
        self.monoculture(crop2)?;
        if let Some(pair) = self.pairs.iter().find(|p| p.is_pair(crop1, crop2)) {
            return Ok((pair.factors, pair.factors));
        }
        Ok((self.averaged_factors(crop1)?, self.averaged_factors(crop2)?))
    }

    /**
    Predicts the water of two crops planted together under standard irrigation.

    # Errors
    [`WaterError::UnknownCrop`] for a crop without monoculture data,
    [`WaterError::NoInteractionData`] for an unmeasured combination with a crop
    that appears in no measured pair, [`WaterError::InvalidRatio`].
    */
    pub fn predict_combination(
        &self,
        crop1: &str,
        crop2: &str,
        ratio: (f64, f64),
    ) -> Result<SystemWater> {
        let mono = (*self.monoculture(crop1)?, *self.monoculture(crop2)?);
        let water = intercrop_water(mono, self.factors(crop1, crop2)?, ratio)?;
        let savings_pct =
            savings_vs_monoculture(water.total(), (mono.0.total(), mono.1.total()), ratio)?;
        Ok(SystemWater {
            water,
            total: water.total(),
            savings_pct,
            additional_savings_pct: 0.0,
        })
    }

    /// Same prediction with the gravity drip savings of an operating head [m]
    /// applied to both stage windows.
    pub fn predict_with_drip(
        &self,
        crop1: &str,
        crop2: &str,
        ratio: (f64, f64),
        operating_head_m: f64,
    ) -> Result<SystemWater> {
        let standard = self.predict_combination(crop1, crop2, ratio)?;
        let water = StageWater::new(
            apply_drip_savings(standard.water.initial, operating_head_m),
            apply_drip_savings(standard.water.development, operating_head_m),
        );
        let mono = (self.monoculture(crop1)?.total(), self.monoculture(crop2)?.total());
        let additional_savings_pct = if standard.total > 0.0 {
            (1.0 - water.total() / standard.total) * 100.0
        } else {
            0.0
        };
        Ok(SystemWater {
            water,
            total: water.total(),
            savings_pct: savings_vs_monoculture(water.total(), mono, ratio)?,
            additional_savings_pct,
        })
    }

    /// A monoculture under gravity drip, savings taken against its standard
    /// irrigation water.
    pub fn monoculture_with_drip(&self, crop: &str, operating_head_m: f64) -> Result<SystemWater> {
        let standard = *self.monoculture(crop)?;
        let water = StageWater::new(
            apply_drip_savings(standard.initial, operating_head_m),
            apply_drip_savings(standard.development, operating_head_m),
        );
        let savings_pct = if standard.total() > 0.0 {
            water_savings_for_head(operating_head_m)
        } else {
            0.0
        };
        Ok(SystemWater {
            water,
            total: water.total(),
            savings_pct,
            additional_savings_pct: 0.0,
        })
    }
}
