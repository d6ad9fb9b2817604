use std::path::PathBuf;

use thiserror::Error;

/// Error type for crop table loading, configuration and window aggregation.
#[derive(Error, Debug)]
pub enum WaterError {
    #[error("stage '{stage}' not found for crop '{crop}'")]
    MissingStage { crop: String, stage: String },

    #[error("invalid stage '{stage}' for crop '{crop}': {reason}")]
    InvalidStage {
        crop: String,
        stage: String,
        reason: String,
    },

    #[error("unknown crop: {0}")]
    UnknownCrop(String),

    #[error("cultivated area must be a positive number of m², got {0}")]
    InvalidArea(f64),

    #[error("no intercrop measurements involve crop '{0}'")]
    NoInteractionData(String),

    #[error("planting ratio must be two non-negative shares with a positive sum, got {0}:{1}")]
    InvalidRatio(f64, f64),

    #[error("invalid drip design input: {0}")]
    InvalidDripInput(String),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, WaterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_error_display() {
        let err = WaterError::MissingStage {
            crop: "Rice".to_string(),
            stage: "Initial".to_string(),
        };
        assert_eq!(err.to_string(), "stage 'Initial' not found for crop 'Rice'");

        let err = WaterError::UnknownCrop("cassava".to_string());
        assert_eq!(err.to_string(), "unknown crop: cassava");

        let err = WaterError::InvalidArea(-1.0);
        assert_eq!(
            err.to_string(),
            "cultivated area must be a positive number of m², got -1"
        );

        let err = WaterError::InvalidRatio(0.0, 0.0);
        assert_eq!(
            err.to_string(),
            "planting ratio must be two non-negative shares with a positive sum, got 0:0"
        );
    }
}
