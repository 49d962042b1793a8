//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Gaussian variability applied to noiseless base series."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, Result};
use crate::rng::NoiseStream;
use crate::series::BaseSeries;

/// How the noise deviation relates to the base signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum NoiseKind {
    /// Deviation scales with the local value; zero slots stay zero.
    #[default]
    Multiplicative,
    /// Fixed deviation of `relative_std_dev * reference` at every point. Without an
    /// explicit reference the mean of the base series is used.
    Additive {
        #[serde(default)]
        reference: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseSpec {
    #[serde(flatten)]
    pub kind: NoiseKind,
    pub relative_std_dev: f64,
    pub seed: u64,
}

impl NoiseSpec {
    pub fn multiplicative(relative_std_dev: f64, seed: u64) -> Self {
        Self {
            kind: NoiseKind::Multiplicative,
            relative_std_dev,
            seed,
        }
    }

    pub fn additive(relative_std_dev: f64, reference: Option<f64>, seed: u64) -> Self {
        Self {
            kind: NoiseKind::Additive { reference },
            relative_std_dev,
            seed,
        }
    }
}

/// Perturbs `base` with a freshly seeded stream and clamps the result to `>= 0`.
pub fn inject(base: &BaseSeries, spec: &NoiseSpec) -> Result<Vec<f64>> {
    let mut stream = NoiseStream::new(spec.seed);
    inject_with(&mut stream, base, spec.relative_std_dev, spec.kind)
}

/// Same as [`inject`] but draws from an existing stream.
pub fn inject_with(
    stream: &mut NoiseStream,
    base: &BaseSeries,
    relative_std_dev: f64,
    kind: NoiseKind,
) -> Result<Vec<f64>> {
    let relative = ensure_non_negative("relative_std_dev", relative_std_dev)?;
    let deviation: Vec<f64> = match kind {
        NoiseKind::Multiplicative => base.values().iter().map(|v| v * relative).collect(),
        NoiseKind::Additive { reference } => {
            let magnitude = match reference {
                Some(value) => ensure_non_negative("reference", value)?,
                None => base.mean(),
            };
            vec![magnitude * relative; base.len()]
        }
    };
    let noisy = stream.sample(base.values(), &deviation)?;
    Ok(noisy.into_iter().map(|v| v.max(0.0)).collect())
}
