use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaterError};
use crate::eto::{DEFAULT_LOCATION_MONTH, EnvironmentalReading};
use crate::window::ObservationWindow;

pub const DEFAULT_FIXED_ETO: f64 = 6.5; // [mm/day]
pub const DEFAULT_AREA_M2: f64 = 0.36; // Trial plot area [m²]
pub const DEFAULT_TRIAL_DAYS: u32 = 37;

fn default_fixed_eto() -> f64 {
    DEFAULT_FIXED_ETO
}

fn default_area() -> f64 {
    DEFAULT_AREA_M2
}

fn default_trial_days() -> u32 {
    DEFAULT_TRIAL_DAYS
}

// Weather at the reference highland site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationParams {
    pub temperature_c: f64,         // [°C]
    pub relative_humidity_pct: f64, // [%]
    pub elevation_m: f64,           // [m]
    pub month: u32,                 // 1-12
}

impl Default for LocationParams {
    // Cool dry season
    fn default() -> Self {
        let reading = EnvironmentalReading::cool_season();
        LocationParams {
            temperature_c: reading.temperature_c,
            relative_humidity_pct: reading.relative_humidity_pct,
            elevation_m: reading.elevation_m,
            month: DEFAULT_LOCATION_MONTH,
        }
    }
}

impl LocationParams {
    pub fn reading(&self) -> EnvironmentalReading {
        EnvironmentalReading::new(
            self.temperature_c,
            self.relative_humidity_pct,
            self.elevation_m,
        )
    }
}

/// Where the reference evapotranspiration of an analysis comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum EtoSource {
    /// The trials' design value.
    Fixed {
        #[serde(default = "default_fixed_eto")]
        value: f64,
    },
    /// Location-adjusted Hargreaves-Samani with the month's seasonal factor.
    Location(LocationParams),
    /// Any user-supplied value, trusted as-is.
    Custom { value: f64 },
}

impl Default for EtoSource {
    fn default() -> Self {
        EtoSource::Fixed {
            value: DEFAULT_FIXED_ETO,
        }
    }
}

impl EtoSource {
    pub fn name(&self) -> &'static str {
        match self {
            EtoSource::Fixed { .. } => "fixed",
            EtoSource::Location(_) => "location",
            EtoSource::Custom { .. } => "custom",
        }
    }
}

/// Parameters of a crop water analysis.
///
/// ```toml
/// area_m2 = 0.36
/// trial_days = 37
///
/// [eto]
/// mode = "location"
/// month = 1
///
/// [windows.Maize]
/// initial = 20
/// development = 17
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_area")]
    pub area_m2: f64, // Cultivated area [m²]
    #[serde(default = "default_trial_days")]
    pub trial_days: u32, // Trial length used to derive windows [day]
    #[serde(default)]
    pub eto: EtoSource,
    // Explicit per-crop windows, overriding those derived from trial_days
    #[serde(default)]
    pub windows: BTreeMap<String, ObservationWindow>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            area_m2: DEFAULT_AREA_M2,
            trial_days: DEFAULT_TRIAL_DAYS,
            eto: EtoSource::default(),
            windows: BTreeMap::new(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_eto(mut self, eto: EtoSource) -> Self {
        self.eto = eto;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.area_m2.is_finite() || self.area_m2 <= 0.0 {
            return Err(WaterError::InvalidArea(self.area_m2));
        }
        Ok(())
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading analysis config from {}", path.display());
        let toml_str = fs::read_to_string(path).map_err(|source| WaterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&toml_str)
    }

    // Configured window for a crop, matched case-insensitively
    pub fn window_for(&self, crop: &str) -> Option<ObservationWindow> {
        self.windows
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(crop))
            .map(|(_, window)| *window)
    }
}
