//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Fixed-resolution daily time axis."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

pub const HOURS_PER_DAY: f64 = 24.0;

/// One sample per minute.
pub const DEFAULT_SAMPLES: usize = 1440;

/// Equally spaced sample instants covering `[0, 24)` hours, starting at hour 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAxis {
    samples: usize,
}

impl TimeAxis {
    pub fn new(samples: usize) -> Result<Self> {
        if samples == 0 {
            return Err(SimError::validation(
                "samples",
                "time axis needs at least one sample",
            ));
        }
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Sample spacing in hours.
    pub fn step_hours(&self) -> f64 {
        HOURS_PER_DAY / self.samples as f64
    }

    pub fn hour_at(&self, index: usize) -> f64 {
        index as f64 * HOURS_PER_DAY / self.samples as f64
    }

    pub fn hours(&self) -> Vec<f64> {
        (0..self.samples).map(|i| self.hour_at(i)).collect()
    }
}

impl Default for TimeAxis {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
        }
    }
}
