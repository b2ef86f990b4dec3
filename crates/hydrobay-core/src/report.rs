//! Read-only inspection summary of a bay, for host UI panels.

use std::fmt;

use crate::bay::{GrowthBay, StageKind};
use crate::config::EngineConfig;
use crate::crop::CropRegistry;
use crate::env::Environment;
use crate::fixed::{Fixed64, fixed64_to_f64};

#[derive(Debug, Clone, PartialEq)]
pub struct BayReport {
    pub crop: Option<String>,
    pub stage: StageKind,
    pub stored: u32,
    pub capacity: u32,
    pub buffered: u32,
    pub growth: f64,
    pub fertility: f64,
    /// `None` renders as N/A.
    pub light: Option<f64>,
    /// `None` when the temperature check is disabled.
    pub temperature: Option<f64>,
    /// `None` when the vacuum check is disabled.
    pub vacuum: Option<f64>,
}

impl BayReport {
    pub fn new(
        bay: &GrowthBay,
        crops: &CropRegistry,
        env: &Environment,
        config: &EngineConfig,
    ) -> Self {
        Self {
            crop: bay
                .crop()
                .and_then(|id| crops.get(id))
                .map(|spec| spec.name.clone()),
            stage: bay.stage_kind(),
            stored: bay.stored_count(),
            capacity: bay.capacity(),
            buffered: bay.buffer_count(),
            growth: fixed64_to_f64(bay.growth()),
            fertility: fixed64_to_f64(bay.fertility()),
            light: bay.last_average_glow().map(fixed64_to_f64),
            temperature: config
                .checks
                .temperature
                .map(|_| fixed64_to_f64(env.temperature)),
            vacuum: config
                .checks
                .max_vacuum
                .map(|_: Fixed64| fixed64_to_f64(env.vacuum)),
        }
    }
}

fn percent(v: f64) -> String {
    format!("{:.0}%", v * 100.0)
}

impl fmt::Display for BayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Currently growing: {}",
            self.crop.as_deref().unwrap_or("None")
        )?;
        writeln!(f, "Stage: {:?}", self.stage)?;
        writeln!(f, "Stored plants: {} / {}", self.stored, self.capacity)?;
        if self.buffered > 0 {
            writeln!(f, "Harvested: {}", self.buffered)?;
        }
        writeln!(f, "Growth: {}", percent(self.growth))?;
        writeln!(f, "Fertility: {}", percent(self.fertility))?;
        match self.light {
            Some(l) => writeln!(f, "Light: {}", percent(l))?,
            None => writeln!(f, "Light: N/A")?,
        }
        match self.temperature {
            Some(t) => writeln!(f, "Temp: {t:.1}°C")?,
            None => writeln!(f, "Temp: N/A")?,
        }
        match self.vacuum {
            Some(v) => write!(f, "Vacuum: {}", percent(v)),
            None => write!(f, "Vacuum: N/A"),
        }
    }
}
