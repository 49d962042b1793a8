//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Noiseless base series and finished power series."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::axis::HOURS_PER_DAY;
use crate::error::{Result, SimError};

const WATTS_PER_KILOWATT: f64 = 1000.0;

/// Noiseless expected power in Watts, one value per axis sample.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseSeries {
    values: Vec<f64>,
}

impl BaseSeries {
    /// Wraps shaped values, rejecting negative or non-finite samples.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(SimError::domain(format!(
                "base sample {index} is {value}, expected a finite non-negative value"
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Multiplies every sample by a non-negative factor.
    pub fn scaled(&self, factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(SimError::validation(
                "multiplier",
                format!("{factor} must be finite and non-negative"),
            ));
        }
        Ok(Self {
            values: self.values.iter().map(|v| v * factor).collect(),
        })
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Whether a finished series is emitted as integral Watts or raw reals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputRounding {
    /// Round half to even after clamping.
    #[default]
    IntegerWatts,
    Real,
}

/// Final non-negative power profile handed to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSeries {
    values: Vec<f64>,
    rounding: OutputRounding,
}

impl PowerSeries {
    /// Clamps `values` to zero and applies `rounding`.
    pub fn finish(values: Vec<f64>, rounding: OutputRounding) -> Self {
        let values = values
            .into_iter()
            .map(|v| {
                let clamped = v.max(0.0);
                match rounding {
                    OutputRounding::IntegerWatts => clamped.round_ties_even(),
                    OutputRounding::Real => clamped,
                }
            })
            .collect();
        Self { values, rounding }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn rounding(&self) -> OutputRounding {
        self.rounding
    }

    pub fn is_integral(&self) -> bool {
        matches!(self.rounding, OutputRounding::IntegerWatts)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Integral Watts, available when the series was rounded.
    pub fn as_watts(&self) -> Option<Vec<i64>> {
        self.is_integral()
            .then(|| self.values.iter().map(|v| *v as i64).collect())
    }

    pub fn stats(&self) -> SeriesStats {
        SeriesStats::from_values(&self.values)
    }
}

/// Summary statistics of a power series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub count: usize,
    pub mean_w: f64,
    pub std_dev_w: f64,
    pub min_w: f64,
    pub max_w: f64,
    pub energy_kwh: f64,
}

impl SeriesStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                mean_w: 0.0,
                std_dev_w: 0.0,
                min_w: 0.0,
                max_w: 0.0,
                energy_kwh: 0.0,
            };
        }
        let mean_w = values.iter().mean();
        let std_dev_w = if values.len() > 1 {
            values.iter().std_dev()
        } else {
            0.0
        };
        let min_w = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max_w = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            count: values.len(),
            mean_w,
            std_dev_w,
            min_w,
            max_w,
            energy_kwh: mean_w * HOURS_PER_DAY / WATTS_PER_KILOWATT,
        }
    }
}
