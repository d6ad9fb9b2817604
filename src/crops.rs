use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, WaterError};
use crate::stage::CropStageTable;

// Crop tables used by the irrigation trials
const BUILTIN_TABLES: &str = include_str!("../crop_tables.toml");

#[derive(Deserialize)]
struct CropTablesFile {
    #[serde(rename = "crop", default)]
    crops: Vec<CropStageTable>,
}

/// Collection of crop stage tables, kept in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CropLibrary {
    tables: Vec<CropStageTable>,
}

impl CropLibrary {
    pub fn new(tables: Vec<CropStageTable>) -> Result<Self> {
        for table in &tables {
            table.validate()?;
        }
        Ok(CropLibrary { tables })
    }

    /// Onion, beans, maize and rice tables of the 37-day trials.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_TABLES)
    }

    // Parse `[[crop]]` tables, each with ordered `[[crop.stage]]` entries
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let file: CropTablesFile = toml::from_str(toml_str)?;
        Self::new(file.crops)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading crop tables from {}", path.display());
        let toml_str = fs::read_to_string(path).map_err(|source| WaterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&toml_str)
    }

    // Case-insensitive lookup by crop name
    pub fn get(&self, crop: &str) -> Result<&CropStageTable> {
        self.tables
            .iter()
            .find(|t| t.crop.eq_ignore_ascii_case(crop))
            .ok_or_else(|| WaterError::UnknownCrop(crop.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropStageTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{AdditionalTerms, DEVELOPMENT, INITIAL, MID_SEASON};

    #[test]
    fn builtin_tables() {
        let library = CropLibrary::builtin().unwrap();
        let names: Vec<_> = library.iter().map(|t| t.crop.as_str()).collect();
        assert_eq!(names, vec!["Onion", "Beans", "Maize", "Rice"]);

        let maize = library.get("maize").unwrap();
        assert_eq!(maize.stages.len(), 4);
        assert_eq!(maize.stage(INITIAL).unwrap().coefficient, 0.4);
        assert_eq!(maize.stage(INITIAL).unwrap().duration_days, 20);
        assert_eq!(maize.total_days(), 125);
        assert!(maize.stage(INITIAL).unwrap().additional.is_none());

        let rice = library.get("Rice").unwrap();
        assert!(rice.stage(DEVELOPMENT).is_none());
        assert_eq!(
            rice.stage(INITIAL).unwrap().additional,
            Some(AdditionalTerms::new(60.0, 6.0, 10.0))
        );
        assert_eq!(
            rice.stage(MID_SEASON).unwrap().additional,
            Some(AdditionalTerms::new(0.0, 6.0, 10.0))
        );
    }

    #[test]
    fn unknown_crop() {
        let library = CropLibrary::builtin().unwrap();
        assert!(matches!(library.get("cassava"), Err(WaterError::UnknownCrop(_))));
    }

    #[test]
    fn custom_table_is_validated() {
        let toml_str = r#"
            [[crop]]
            name = "Kale"

            [[crop.stage]]
            name = "Initial"
            kc = -0.7
            days = 20
        "#;
        let err = CropLibrary::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, WaterError::InvalidStage { .. }));
    }

    #[test]
    fn overlong_lifecycle_is_rejected() {
        let toml_str = r#"
            [[crop]]
            name = "Teak"

            [[crop.stage]]
            name = "Initial"
            kc = 0.5
            days = 4294967295

            [[crop.stage]]
            name = "Development"
            kc = 0.7
            days = 10
        "#;
        let err = CropLibrary::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, WaterError::InvalidStage { ref stage, .. } if stage == "Development"));
    }

    #[test]
    fn malformed_toml() {
        let err = CropLibrary::from_toml_str("[[crop]]\nname = 3").unwrap_err();
        assert!(matches!(err, WaterError::Parse(_)));
    }

    #[test]
    fn missing_file() {
        let err = CropLibrary::from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, WaterError::Io { .. }));
    }
}
