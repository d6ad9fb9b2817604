//! Reference evapotranspiration (ETo) from a simplified Hargreaves-Samani formula.
//!
//! When no daily minimum/maximum temperature series is available the diurnal
//! temperature swing is approximated from relative humidity, and extraterrestrial
//! radiation is replaced by an elevation-scaled proxy. The optional location
//! adjustment targets an equatorial highland site (~1750 m, two rainy seasons):
//! it raises the minimum temperature range, weighs elevation more heavily,
//! softens the humidity correction and narrows the output clamp.
//!
//! All values are in mm/day.

use serde::{Deserialize, Serialize};

const SOLAR_CONSTANT: f64 = 0.082; // MJ/m²/min
const MINUTES_PER_DAY_FRACTION: f64 = 24.0 * 60.0 * 0.4; // effective radiation minutes per day
const MJ_TO_MM: f64 = 0.408; // MJ/m²/day to mm/day of evaporated water

/// Seasonal factor applied to location-adjusted ETo when no month is given.
pub const DEFAULT_LOCATION_MONTH: u32 = 7;

// Method used to obtain an ETo value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EtoMethod {
    Fixed,
    Calculated,
}

impl EtoMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EtoMethod::Fixed => "fixed",
            EtoMethod::Calculated => "calculated",
        }
    }
}

impl std::fmt::Display for EtoMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Weather inputs to the ETo formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalReading {
    pub temperature_c: f64,         // Mean air temperature [°C]
    pub relative_humidity_pct: f64, // Relative humidity [%]
    pub elevation_m: f64,           // Site elevation above sea level [m]
}

impl EnvironmentalReading {
    pub fn new(temperature_c: f64, relative_humidity_pct: f64, elevation_m: f64) -> Self {
        EnvironmentalReading {
            temperature_c,
            relative_humidity_pct,
            elevation_m,
        }
    }

    /// Typical cool dry season conditions at the reference highland site.
    pub fn cool_season() -> Self {
        EnvironmentalReading::new(17.0, 80.0, 1750.0)
    }
}

// Formula constants that differ between the standard and location-adjusted variants
struct EtoCoefficients {
    min_temp_range: f64,      // Lower bound of the humidity-derived temperature range [°C]
    elevation_scale: f64,     // Elevation divisor of the radiation proxy [m]
    humidity_coef: f64,       // Slope of the humidity correction [-]
    min_humidity_factor: f64, // Floor of the humidity correction [-]
    clamp: (f64, f64),        // Output bounds [mm/day]
}

const STANDARD: EtoCoefficients = EtoCoefficients {
    min_temp_range: 5.0,
    elevation_scale: 10000.0,
    humidity_coef: 0.15,
    min_humidity_factor: 0.85,
    clamp: (2.0, 15.0),
};

const LOCATION_ADJUSTED: EtoCoefficients = EtoCoefficients {
    min_temp_range: 8.0,
    elevation_scale: 8000.0,
    humidity_coef: 0.12,
    min_humidity_factor: 0.88,
    clamp: (2.5, 12.0),
};

/**
Calculates reference evapotranspiration.

A `fixed_override` is returned unchanged with [`EtoMethod::Fixed`]; it is
trusted as-is and every other argument is ignored. Otherwise ETo is calculated
and clamped to [2.0, 15.0] mm/day, or [2.5, 12.0] mm/day when
`location_adjust` is set. This never fails: implausible readings are clamped,
not rejected.

# Returns
`(eto, method)` with `eto` in mm/day.
*/
pub fn compute_eto(
    reading: &EnvironmentalReading,
    fixed_override: Option<f64>,
    location_adjust: bool,
) -> (f64, EtoMethod) {
    if let Some(eto) = fixed_override {
        return (eto, EtoMethod::Fixed);
    }

    let coef = if location_adjust {
        &LOCATION_ADJUSTED
    } else {
        &STANDARD
    };
    let humidity = reading.relative_humidity_pct / 100.0;

    // Diurnal temperature range estimated from humidity
    let temp_range = coef.min_temp_range.max(12.0 * (1.0 - humidity));

    // Extraterrestrial radiation proxy
    let elevation_factor = 1.0 + reading.elevation_m / coef.elevation_scale;
    let ra_mm = SOLAR_CONSTANT * elevation_factor * MINUTES_PER_DAY_FRACTION * MJ_TO_MM;

    // Hargreaves-Samani
    let eto = 0.0023 * (reading.temperature_c + 17.8) * temp_range.sqrt() * ra_mm;

    let humidity_factor = (1.0 - coef.humidity_coef * humidity)
        .min(1.0)
        .max(coef.min_humidity_factor);
    let eto = eto * humidity_factor;

    // NaN inputs fall to the lower bound
    let (lo, hi) = coef.clamp;
    let eto = if eto.is_nan() { lo } else { eto.clamp(lo, hi) };
    (eto, EtoMethod::Calculated)
}

/// Seasonal ETo multiplier for the reference highland site, by calendar month (1-12).
pub fn seasonal_factor(month: u32) -> f64 {
    match month {
        1 | 2 => 1.1,   // Hot dry
        3..=5 => 0.9,   // Long rains
        6..=9 => 1.0,   // Cool dry
        10..=12 => 0.9, // Short rains
        _ => 1.0,
    }
}

/// Whether a reading lies inside the reference site's typical climate envelope.
///
/// Advisory only, out-of-range readings are still used.
pub fn is_within_typical_range(reading: &EnvironmentalReading) -> bool {
    (10.0..=26.0).contains(&reading.temperature_c)
        && (60.0..=84.0).contains(&reading.relative_humidity_pct)
        && (1400.0..=2500.0).contains(&reading.elevation_m)
}

// Location-adjusted ETo with its seasonal scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationEto {
    pub base: f64,                  // Location-adjusted ETo before seasonal scaling [mm/day]
    pub seasonal_factor: f64,       // Month multiplier [-]
    pub eto: f64,                   // base * seasonal_factor [mm/day]
    pub within_typical_range: bool, // Advisory envelope check
}

/// Location-adjusted ETo scaled by the month's seasonal factor.
pub fn location_eto(reading: &EnvironmentalReading, month: u32) -> LocationEto {
    let (base, _) = compute_eto(reading, None, true);
    let factor = seasonal_factor(month);
    LocationEto {
        base,
        seasonal_factor: factor,
        eto: base * factor,
        within_typical_range: is_within_typical_range(reading),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn fixed_override_is_returned_unchanged() {
        let reading = EnvironmentalReading::new(-40.0, 250.0, 99999.0);
        for eto in [0.1, 6.5, 42.0] {
            assert_eq!(compute_eto(&reading, Some(eto), false), (eto, EtoMethod::Fixed));
            assert_eq!(compute_eto(&reading, Some(eto), true), (eto, EtoMethod::Fixed));
        }
    }

    #[test]
    fn cool_season_location_eto() {
        // temp_range = 8, Ra = 19.270656 * 1.21875, humidity factor 0.904
        let (eto, method) = compute_eto(&EnvironmentalReading::cool_season(), None, true);
        assert_eq!(method, EtoMethod::Calculated);
        assert_abs_diff_eq!(eto, 4.80653, epsilon = 1e-4);
    }

    #[test]
    fn standard_eto_dry_air() {
        // humidity 0: temp_range 12, humidity factor 1.0, elevation 0
        let reading = EnvironmentalReading::new(25.0, 0.0, 0.0);
        let (eto, _) = compute_eto(&reading, None, false);
        let expected = 0.0023 * 42.8 * 12.0_f64.sqrt() * 19.270656;
        assert_abs_diff_eq!(eto, expected, epsilon = 1e-9);
    }

    #[test]
    fn clamp_bounds_hold_for_extreme_inputs() {
        for humidity in 0..=100 {
            for temperature in [-60.0, -17.8, 0.0, 20.0, 45.0, 80.0] {
                for elevation in [-400.0, 0.0, 1750.0, 5000.0, 30000.0] {
                    let reading =
                        EnvironmentalReading::new(temperature, humidity as f64, elevation);
                    let (std_eto, _) = compute_eto(&reading, None, false);
                    assert!((2.0..=15.0).contains(&std_eto), "standard {std_eto}");
                    let (loc_eto, _) = compute_eto(&reading, None, true);
                    assert!((2.5..=12.0).contains(&loc_eto), "adjusted {loc_eto}");
                }
            }
        }
    }

    #[test]
    fn seasonal_factor_buckets() {
        assert_eq!(seasonal_factor(1), 1.1);
        assert_eq!(seasonal_factor(2), 1.1);
        assert_eq!(seasonal_factor(4), 0.9);
        assert_eq!(seasonal_factor(7), 1.0);
        assert_eq!(seasonal_factor(11), 0.9);
        assert_eq!(seasonal_factor(0), 1.0);
        assert_eq!(seasonal_factor(13), 1.0);
    }

    #[test]
    fn typical_range_envelope() {
        assert!(is_within_typical_range(&EnvironmentalReading::cool_season()));
        assert!(is_within_typical_range(&EnvironmentalReading::new(10.0, 60.0, 1400.0)));
        assert!(is_within_typical_range(&EnvironmentalReading::new(26.0, 84.0, 2500.0)));
        assert!(!is_within_typical_range(&EnvironmentalReading::new(30.0, 70.0, 1750.0)));
        assert!(!is_within_typical_range(&EnvironmentalReading::new(20.0, 90.0, 1750.0)));
        assert!(!is_within_typical_range(&EnvironmentalReading::new(20.0, 70.0, 100.0)));
    }

    #[test]
    fn location_eto_applies_season() {
        let reading = EnvironmentalReading::cool_season();
        let hot = location_eto(&reading, 1);
        assert_abs_diff_eq!(hot.eto, hot.base * 1.1, epsilon = 1e-12);
        assert!(hot.within_typical_range);

        let cool = location_eto(&reading, DEFAULT_LOCATION_MONTH);
        assert_eq!(cool.eto, cool.base);
    }
}
