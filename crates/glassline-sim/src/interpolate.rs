//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Anchor curve resampling for curve-interpolated profiles."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    /// Piecewise cubic Hermite with Fritsch-Carlson slopes; no overshoot.
    #[default]
    Pchip,
    /// Straight segments, holding the end values outside the anchor range.
    Linear,
}

impl Interpolation {
    pub fn resample(self, xs: &[f64], ys: &[f64], targets: &[f64]) -> Result<Vec<f64>> {
        check_anchors(xs, ys)?;
        Ok(match self {
            Interpolation::Pchip => {
                let slopes = pchip_slopes(xs, ys);
                targets
                    .iter()
                    .map(|x| hermite_at(xs, ys, &slopes, *x))
                    .collect()
            }
            Interpolation::Linear => targets.iter().map(|x| linear_at(xs, ys, *x)).collect(),
        })
    }
}

fn check_anchors(xs: &[f64], ys: &[f64]) -> Result<()> {
    if xs.len() != ys.len() {
        return Err(SimError::domain(format!(
            "{} anchor positions for {} anchor values",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(SimError::domain("interpolation needs at least two anchors"));
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return Err(SimError::domain("anchor curve contains non-finite values"));
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SimError::domain(
            "anchor positions must be strictly increasing",
        ));
    }
    Ok(())
}

/// Index of the interval `[xs[k], xs[k + 1]]` used for `x`, extending the end intervals.
fn interval(xs: &[f64], x: f64) -> usize {
    let last = xs.len() - 2;
    match xs.partition_point(|v| *v <= x) {
        0 => 0,
        k => (k - 1).min(last),
    }
}

fn pchip_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (ys[k + 1] - ys[k]) / h[k]).collect();

    if n == 2 {
        return vec![delta[0]; 2];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        if delta[k - 1] * delta[k] <= 0.0 {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
    }
    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

/// Three-point end condition, limited so the end interval stays monotone.
fn end_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if sign(d) != sign(m0) {
        0.0
    } else if sign(m0) != sign(m1) && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

/// Sign with an explicit zero, unlike `f64::signum`.
fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

fn hermite_at(xs: &[f64], ys: &[f64], d: &[f64], x: f64) -> f64 {
    let k = interval(xs, x);
    let h = xs[k + 1] - xs[k];
    let t = (x - xs[k]) / h;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * ys[k] + h10 * h * d[k] + h01 * ys[k + 1] + h11 * h * d[k + 1]
}

fn linear_at(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len();
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }
    let k = interval(xs, x);
    let t = (x - xs[k]) / (xs[k + 1] - xs[k]);
    ys[k] + t * (ys[k + 1] - ys[k])
}
