//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Deterministic per-machine random number provisioning."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Every generation call seeds its own generator from the machine index, so
//! profiles never depend on call order or on other machines being generated.
use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::error::{Result, SimError};

/// Offset added to the machine index by default.
pub const DEFAULT_SEED_OFFSET: u64 = 48;

/// Maps a machine index to its reproducible seed: `offset + machine_index`.
pub fn seed_for(offset: u64, machine_index: u32) -> u64 {
    offset.wrapping_add(u64::from(machine_index))
}

/// Draws `mean[i] + stddev[i] * z_i` from a freshly seeded generator.
///
/// One standard-normal value is drawn per point even where the deviation is zero,
/// which keeps stream positions independent of the data and leaves such points
/// exactly at their mean.
pub fn sample_gaussian(mean: &[f64], stddev: &[f64], seed: u64) -> Result<Vec<f64>> {
    NoiseStream::new(seed).sample(mean, stddev)
}

/// A seeded standard-normal stream shared by the components of one generation call.
#[derive(Debug)]
pub struct NoiseStream {
    rng: StdRng,
}

impl NoiseStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self, mean: &[f64], stddev: &[f64]) -> Result<Vec<f64>> {
        if mean.len() != stddev.len() {
            return Err(SimError::domain(format!(
                "mean has {} samples but deviation has {}",
                mean.len(),
                stddev.len()
            )));
        }
        if let Some(bad) = stddev.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(SimError::validation(
                "stddev",
                format!("standard deviation {bad} must be finite and non-negative"),
            ));
        }
        Ok(mean
            .iter()
            .zip(stddev)
            .map(|(m, s)| {
                let z: f64 = self.rng.sample(StandardNormal);
                m + s * z
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_follow_offset_plus_index() {
        assert_eq!(seed_for(DEFAULT_SEED_OFFSET, 0), 48);
        assert_eq!(seed_for(DEFAULT_SEED_OFFSET, 3), 51);
        assert_eq!(seed_for(42, 0), 42);
    }

    #[test]
    fn same_seed_gives_identical_draws() {
        let mean = vec![10.0; 64];
        let sd = vec![1.0; 64];
        let a = sample_gaussian(&mean, &sd, 7).unwrap();
        let b = sample_gaussian(&mean, &sd, 7).unwrap();
        let c = sample_gaussian(&mean, &sd, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_deviation_returns_mean_exactly() {
        let mean = vec![0.0, 5.0, 0.0];
        let out = sample_gaussian(&mean, &[0.0; 3], 1).unwrap();
        assert_eq!(out, mean);
    }

    #[test]
    fn negative_deviation_is_validation_error() {
        let err = sample_gaussian(&[1.0], &[-0.1], 1).unwrap_err();
        assert!(matches!(err, SimError::Validation { .. }));
    }

    #[test]
    fn stream_continues_across_components() {
        let mut stream = NoiseStream::new(11);
        let first = stream.sample(&[0.0; 4], &[1.0; 4]).unwrap();
        let second = stream.sample(&[0.0; 4], &[1.0; 4]).unwrap();
        assert_ne!(first, second);
        let joined = sample_gaussian(&[0.0; 8], &[1.0; 8], 11).unwrap();
        assert_eq!(&joined[..4], first.as_slice());
        assert_eq!(&joined[4..], second.as_slice());
    }
}
