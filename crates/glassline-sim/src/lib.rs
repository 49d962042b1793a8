//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "01-bootstrap"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Power profile engine module exports and shared types."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Synthetic per-minute power profiles for the machines of a glass production line.
//!
//! A [`MachineProfile`] shapes a noiseless [`BaseSeries`] over a [`TimeAxis`], applies
//! its multiplier chain, perturbs the result with seeded Gaussian noise and hands a
//! [`PowerSeries`] to a [`SeriesSink`]. Generation holds no state between calls.

pub mod axis;
pub mod catalog;
pub mod error;
pub mod interpolate;
pub mod noise;
pub mod rng;
pub mod scenario;
pub mod series;
pub mod shaper;
pub mod sink;

pub use axis::{TimeAxis, DEFAULT_SAMPLES, HOURS_PER_DAY};
pub use catalog::MachineKind;
pub use error::{Result, SimError, SinkError};
pub use interpolate::Interpolation;
pub use noise::{inject, NoiseKind, NoiseSpec};
pub use rng::{sample_gaussian, seed_for, NoiseStream, DEFAULT_SEED_OFFSET};
pub use scenario::{
    Aging, Baseline, CulletSavings, MachineProfile, UnitRequest, VariantFlags,
};
pub use series::{BaseSeries, OutputRounding, PowerSeries, SeriesStats};
pub use shaper::{
    ConstantParams, CurveParams, DutyCycleParams, ProductionParams, Shaping, TilingPhase,
};
pub use sink::{CsvSink, MemorySink, PlotLabels, SeriesSink};
