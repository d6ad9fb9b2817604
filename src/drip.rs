//! Gravity-fed drip irrigation: water savings by operating head and a
//! hydraulic sizing estimate for a tank-fed drip field.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaterError};

const GRAVITY: f64 = 9.81; // [m/s²]
const WATER_DENSITY: f64 = 1000.0; // [kg/m³]
const KINEMATIC_VISCOSITY: f64 = 1e-6; // Water at ~20 °C [m²/s]
const MIN_PRESSURE_KPA: f64 = 50.0; // Minimum pressure at the emitters [kPa]
const MINOR_LOSS_COEFFICIENT: f64 = 2.5; // Fittings and bends [-]
const FIELD_SLOPE: f64 = 0.02; // Assumed field slope [m/m]
const SAFETY_FACTOR: f64 = 1.1;
const OPERATING_HOURS_PER_DAY: f64 = 8.0;
const DEFAULT_FIELD_SIZE_M2: f64 = 100.0;
const LAMINAR_REYNOLDS: f64 = 2300.0;

// Measured water savings of low-cost gravity drip kits: (operating head [m], savings [%])
const SAVINGS_BY_HEAD: [(f64, f64); 5] = [
    (1.0, 18.0),
    (2.5, 22.0),
    (3.5, 23.0),
    (4.5, 24.0),
    (5.5, 25.0),
];

/// Water savings [%] of gravity drip over standard irrigation at an operating head [m].
///
/// Linear interpolation between measured heads, held constant outside them.
pub fn water_savings_for_head(operating_head_m: f64) -> f64 {
    let (first_head, first_savings) = SAVINGS_BY_HEAD[0];
    let (last_head, last_savings) = SAVINGS_BY_HEAD[SAVINGS_BY_HEAD.len() - 1];
    if operating_head_m <= first_head {
        return first_savings;
    }
    if operating_head_m >= last_head {
        return last_savings;
    }

    for pair in SAVINGS_BY_HEAD.windows(2) {
        let (h1, s1) = pair[0];
        let (h2, s2) = pair[1];
        if operating_head_m >= h1 && operating_head_m <= h2 {
            return s1 + (s2 - s1) * (operating_head_m - h1) / (h2 - h1);
        }
    }
    // NaN head
    first_savings
}

// Water needed under gravity drip for a standard-irrigation requirement
pub fn apply_drip_savings(water: f64, operating_head_m: f64) -> f64 {
    water * (1.0 - water_savings_for_head(operating_head_m) / 100.0)
}

// Layout and hardware of a tank-fed drip field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DripDesignInput {
    pub tank_volume_liters: f64,       // Storage tank capacity [L]
    pub emitter_flow_rate_lph: f64,    // Flow per emitter [L/h]
    pub number_of_plants: Option<u32>, // One emitter per plant
    pub field_size_m2: Option<f64>,    // Field area [m²]
    pub tank_elevation_m: Option<f64>, // Tank height above the field [m]
    pub emitter_spacing_m: f64,        // Along the line [m]
    pub row_spacing_m: f64,            // Between lines [m]
    pub pipe_diameter_mm: f64,         // Main pipe inner diameter [mm]
    pub efficiency: f64,               // Application efficiency (0, 1]
}

impl Default for DripDesignInput {
    fn default() -> Self {
        DripDesignInput {
            tank_volume_liters: 2000.0,
            emitter_flow_rate_lph: 2.0,
            number_of_plants: None,
            field_size_m2: None,
            tank_elevation_m: None,
            emitter_spacing_m: 0.3,
            row_spacing_m: 1.0,
            pipe_diameter_mm: 16.0,
            efficiency: 0.9,
        }
    }
}

impl DripDesignInput {
    fn validate(&self) -> Result<()> {
        let positive = [
            ("tank volume", self.tank_volume_liters),
            ("emitter flow rate", self.emitter_flow_rate_lph),
            ("emitter spacing", self.emitter_spacing_m),
            ("row spacing", self.row_spacing_m),
            ("pipe diameter", self.pipe_diameter_mm),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(WaterError::InvalidDripInput(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.efficiency > 0.0 && self.efficiency <= 1.0) {
            return Err(WaterError::InvalidDripInput(format!(
                "efficiency must be in (0, 1], got {}",
                self.efficiency
            )));
        }
        if let Some(size) = self.field_size_m2 {
            if !size.is_finite() || size <= 0.0 {
                return Err(WaterError::InvalidDripInput(format!(
                    "field size must be positive, got {size}"
                )));
            }
        }
        if let Some(elevation) = self.tank_elevation_m {
            if !elevation.is_finite() || elevation < 0.0 {
                return Err(WaterError::InvalidDripInput(format!(
                    "tank elevation must be a non-negative number, got {elevation}"
                )));
            }
        }
        Ok(())
    }

    // Field area and emitter count from whichever of plants/field size was given
    fn field_layout(&self) -> (f64, u32) {
        let per_emitter = self.emitter_spacing_m * self.row_spacing_m;
        let fits = |size: f64| (size / per_emitter).floor() as u32;
        match (self.number_of_plants, self.field_size_m2) {
            (Some(plants), None) => (f64::from(plants) * per_emitter, plants),
            (None, Some(size)) => (size, fits(size)),
            (Some(plants), Some(size)) => (size, plants.min(fits(size))),
            (None, None) => (DEFAULT_FIELD_SIZE_M2, fits(DEFAULT_FIELD_SIZE_M2)),
        }
    }
}

// Hydraulic estimate of a drip system
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DripDesign {
    pub elevation_needed_m: f64,      // Given tank elevation, or the required one [m]
    pub recommended_elevation_m: f64, // Required head with safety factor [m]
    pub max_coverage_area_m2: f64,    // Area the available pressure can serve [m²]
    pub field_size_m2: f64,           // [m²]
    pub field_length_m: f64,          // Side of a square field [m]
    pub total_emitters: u32,
    pub flow_rate_total_lph: f64,     // Including efficiency losses [L/h]
    pub operating_time_hours: f64,    // Run time per full tank [h]
    pub friction_loss_m: f64,         // Darcy-Weisbach plus minor losses [m]
    pub water_velocity_ms: f64,       // In the main pipe [m/s]
    pub daily_refills_needed: f64,    // For an 8 h irrigation day
    pub operating_pressure_kpa: f64,  // [kPa]
    pub pressure_adequate: bool,      // Operating pressure >= 50 kPa
    pub slope_impact_m: f64,          // Head lost to the field slope [m]
}

/**
Sizes a gravity-fed drip system.

With a positive tank elevation the available pressure is checked against the
50 kPa emitter minimum and the coverable area scaled down when it falls short.
Without one, or with a tank at field level (0 m), the elevation needed for the minimum pressure plus friction and
slope losses (with a 10 % safety factor) is returned.

Friction uses Darcy-Weisbach over a square field's side length, with the
laminar `64/Re` or the Blasius `0.316/Re^0.25` friction factor.

# Errors
[`WaterError::InvalidDripInput`] for non-positive hardware figures, an
efficiency outside (0, 1], a negative or non-finite tank elevation, or a
field too small for a single emitter.
*/
pub fn design_drip_system(input: &DripDesignInput) -> Result<DripDesign> {
    input.validate()?;

    let (field_size_m2, total_emitters) = input.field_layout();
    if total_emitters == 0 {
        return Err(WaterError::InvalidDripInput(format!(
            "field of {field_size_m2} m² holds no emitter"
        )));
    }

    // Flow
    let flow_rate_total_lph =
        f64::from(total_emitters) * input.emitter_flow_rate_lph / input.efficiency;
    let flow_rate_m3s = flow_rate_total_lph / (3600.0 * 1000.0);

    // Pipe
    let diameter_m = input.pipe_diameter_mm / 1000.0;
    let pipe_area_m2 = std::f64::consts::PI * (diameter_m / 2.0).powi(2);
    let velocity = flow_rate_m3s / pipe_area_m2;

    let field_length_m = field_size_m2.sqrt();

    // Friction and minor losses
    let reynolds = velocity * diameter_m / KINEMATIC_VISCOSITY;
    let velocity_head = velocity.powi(2) / (2.0 * GRAVITY);
    let friction_loss_m = if reynolds > 0.0 {
        let friction_factor = if reynolds < LAMINAR_REYNOLDS {
            64.0 / reynolds
        } else {
            0.316 / reynolds.powf(0.25)
        };
        friction_factor * field_length_m / diameter_m * velocity_head
            + MINOR_LOSS_COEFFICIENT * velocity_head
    } else {
        0.0
    };

    let min_pressure_head = MIN_PRESSURE_KPA * 1000.0 / (WATER_DENSITY * GRAVITY);
    let slope_impact_m = FIELD_SLOPE * field_length_m;
    let required_elevation = (min_pressure_head + friction_loss_m + slope_impact_m) * SAFETY_FACTOR;

    let (elevation_needed_m, operating_pressure_kpa, max_coverage_area_m2, pressure_adequate) =
        match input.tank_elevation_m {
            Some(elevation) if elevation > 0.0 => {
                let available_kpa = elevation * WATER_DENSITY * GRAVITY / 1000.0;
                let adequate = available_kpa >= MIN_PRESSURE_KPA;
                let coverage = if adequate {
                    field_size_m2
                } else {
                    field_size_m2 * available_kpa / MIN_PRESSURE_KPA
                };
                (elevation, available_kpa, coverage, adequate)
            }
            _ => {
                let available_kpa = required_elevation * WATER_DENSITY * GRAVITY / 1000.0;
                (required_elevation, available_kpa, field_size_m2, true)
            }
        };

    let operating_time_hours = input.tank_volume_liters / flow_rate_total_lph;

    Ok(DripDesign {
        elevation_needed_m,
        recommended_elevation_m: required_elevation,
        max_coverage_area_m2,
        field_size_m2,
        field_length_m,
        total_emitters,
        flow_rate_total_lph,
        operating_time_hours,
        friction_loss_m,
        water_velocity_ms: velocity,
        daily_refills_needed: OPERATING_HOURS_PER_DAY / operating_time_hours,
        operating_pressure_kpa,
        pressure_adequate,
        slope_impact_m,
    })
}
