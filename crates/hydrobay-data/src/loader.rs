//! Reads greenhouse data files, resolves crop references, and builds the
//! registry and configs the engine runs on.
//!
//! A data directory holds up to three files, each in RON, TOML or JSON:
//!
//! - `crops` (required): list of [`CropData`].
//! - `bays` (optional): list of [`BayData`] templates.
//! - `settings` (optional): a [`SettingsData`] table.

use hydrobay_core::config::{
    BayConfig, ConfigError, DayWindow, EngineConfig, EnvironmentChecks, TemperatureBand,
};
use hydrobay_core::crop::{CropRegistry, CropRegistryBuilder, CropSpec, RegistryError};
use hydrobay_core::fixed::Fixed64;
use hydrobay_core::id::CropId;
use hydrobay_power::{ScaleError, ScalingConfig};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::schema::{BayData, CropData, EngineData, RangeData, SettingsData};

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files share a base name but not a format.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A number that has no fixed-point representation.
    #[error("field '{field}' in {file} is out of range: {value}")]
    OutOfRange {
        file: PathBuf,
        field: &'static str,
        value: f64,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scaling(#[from] ScaleError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

const EXTENSIONS: [(&str, Format); 3] = [
    ("ron", Format::Ron),
    ("toml", Format::Toml),
    ("json", Format::Json),
];

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    EXTENSIONS
        .iter()
        .find(|(e, _)| Some(*e) == ext)
        .map(|(_, f)| *f)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Find `{base_name}.ron|toml|json` in `dir`. More than one match is an error.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for (ext, _) in EXTENSIONS {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it by extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list. TOML has no top-level arrays, so there the list is
/// read from the array under `toml_key`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        return Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        });
    }
    Ok(())
}

fn to_fixed(value: f64, field: &'static str, file: &Path) -> Result<Fixed64, DataLoadError> {
    value
        .is_finite()
        .then(|| Fixed64::checked_from_num(value))
        .flatten()
        .ok_or_else(|| DataLoadError::OutOfRange {
            file: file.to_path_buf(),
            field,
            value,
        })
}

// ===========================================================================
// Greenhouse data
// ===========================================================================

/// A named bay variant with its crop reference resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct BayTemplate {
    pub name: String,
    pub config: BayConfig,
    pub crop: Option<CropId>,
}

/// Everything needed to stand up a [`Greenhouse`](hydrobay_core::greenhouse::Greenhouse).
#[derive(Debug, Clone)]
pub struct GreenhouseData {
    pub crops: CropRegistry,
    pub bays: Vec<BayTemplate>,
    pub engine: EngineConfig,
    pub scaling: ScalingConfig,
}

impl GreenhouseData {
    pub fn bay(&self, name: &str) -> Option<&BayTemplate> {
        self.bays.iter().find(|b| b.name == name)
    }
}

/// Load and validate every data file in `dir`.
pub fn load_greenhouse_data(dir: &Path) -> Result<GreenhouseData, DataLoadError> {
    let (engine, scaling) = match find_data_file(dir, "settings")? {
        Some(path) => {
            let settings: SettingsData = deserialize_file(&path)?;
            (build_engine_config(&settings.engine, &path)?, settings.scaling)
        }
        None => (EngineConfig::default(), ScalingConfig::default()),
    };
    engine.validate()?;
    scaling.validate()?;

    let crops_path = require_data_file(dir, "crops")?;
    let crop_list: Vec<CropData> = deserialize_list(&crops_path, "crops")?;
    let mut builder = CropRegistryBuilder::new();
    let mut crop_ids: HashMap<String, CropId> = HashMap::new();
    for data in &crop_list {
        check_duplicate(&crop_ids, &data.name, &crops_path)?;
        let id = builder.register(build_crop_spec(data, &crops_path)?)?;
        crop_ids.insert(data.name.clone(), id);
    }
    let crops = builder.build()?;

    let mut bays = Vec::new();
    if let Some(bays_path) = find_data_file(dir, "bays")? {
        let bay_list: Vec<BayData> = deserialize_list(&bays_path, "bays")?;
        let mut seen: HashMap<String, ()> = HashMap::new();
        for data in &bay_list {
            check_duplicate(&seen, &data.name, &bays_path)?;
            seen.insert(data.name.clone(), ());
            bays.push(build_bay_template(data, &crop_ids, &bays_path)?);
        }
    }

    tracing::debug!(
        crops = crops.len(),
        bays = bays.len(),
        dir = %dir.display(),
        "greenhouse data loaded"
    );
    Ok(GreenhouseData {
        crops,
        bays,
        engine,
        scaling,
    })
}

fn build_crop_spec(data: &CropData, file: &Path) -> Result<CropSpec, DataLoadError> {
    Ok(CropSpec {
        name: data.name.clone(),
        grow_days: to_fixed(data.grow_days, "grow_days", file)?,
        min_light: to_fixed(data.min_light, "min_light", file)?,
        optimal_light: to_fixed(data.optimal_light, "optimal_light", file)?,
        lifespan: data.lifespan,
        repeat_threshold: to_fixed(data.repeat_threshold, "repeat_threshold", file)?,
        max_units_per_cell: data.max_units_per_cell,
    })
}

fn build_bay_template(
    data: &BayData,
    crop_ids: &HashMap<String, CropId>,
    file: &Path,
) -> Result<BayTemplate, DataLoadError> {
    let crop = data
        .crop
        .as_deref()
        .map(|name| resolve_name(crop_ids, name, file, "crop").copied())
        .transpose()?;
    let config = BayConfig {
        capacity: data.capacity,
        fertility: to_fixed(data.fertility, "fertility", file)?,
    };
    config.validate()?;
    Ok(BayTemplate {
        name: data.name.clone(),
        config,
        crop,
    })
}

fn build_engine_config(data: &EngineData, file: &Path) -> Result<EngineConfig, DataLoadError> {
    let range = |r: RangeData, field: &'static str| -> Result<(Fixed64, Fixed64), DataLoadError> {
        Ok((to_fixed(r.min, field, file)?, to_fixed(r.max, field, file)?))
    };
    let temperature = data
        .temperature
        .map(|r| range(r, "temperature").map(|(min, max)| TemperatureBand { min, max }))
        .transpose()?;
    let daylight = data
        .daylight
        .map(|r| range(r, "daylight").map(|(start, end)| DayWindow { start, end }))
        .transpose()?;
    let max_vacuum = data
        .max_vacuum
        .map(|v| to_fixed(v, "max_vacuum", file))
        .transpose()?;

    Ok(EngineConfig {
        light_requirement: data.light_requirement,
        power_loss_reset: data.power_loss_reset,
        capacity_scaling_enabled: data.capacity_scaling_enabled,
        ticks_per_day: data.ticks_per_day,
        coarse_interval: data.coarse_interval,
        reference_fertility: to_fixed(data.reference_fertility, "reference_fertility", file)?,
        checks: EnvironmentChecks {
            power: data.require_power,
            temperature,
            daylight,
            max_vacuum,
        },
    })
}

// ===========================================================================
// Tests
// ===========================================================================
