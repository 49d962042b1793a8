//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Noiseless base signal shaping archetypes."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Each archetype is a pure function of its parameters and the time axis. Parameter
//! records validate on construction, so shaping never sees an invalid set.
use serde::{Deserialize, Serialize};

use crate::axis::{TimeAxis, HOURS_PER_DAY};
use crate::error::{
    ensure_non_negative, ensure_positive, ensure_unit_fraction, Result, SimError,
};
use crate::interpolate::Interpolation;
use crate::series::BaseSeries;

pub const WATTS_PER_KILOWATT: f64 = 1000.0;

/// Constant draw, e.g. a furnace held at temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantParams {
    mean_watts: f64,
}

impl ConstantParams {
    pub fn new(mean_watts: f64) -> Result<Self> {
        Ok(Self {
            mean_watts: ensure_non_negative("mean_watts", mean_watts)?,
        })
    }

    /// Constant equivalent of a daily energy budget in kWh.
    pub fn from_daily_kwh(kwh_per_day: f64) -> Result<Self> {
        let kwh = ensure_non_negative("kwh_per_day", kwh_per_day)?;
        Self::new(kwh / HOURS_PER_DAY * WATTS_PER_KILOWATT)
    }

    pub fn mean_watts(&self) -> f64 {
        self.mean_watts
    }
}

/// Daily throughput spread evenly over the day and converted through a
/// consumption-per-ton coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionParams {
    daily_tons: f64,
    kwh_per_ton: f64,
    temperature_drop_c: Option<f64>,
}

impl ProductionParams {
    pub fn new(daily_tons: f64, kwh_per_ton: f64) -> Result<Self> {
        Ok(Self {
            daily_tons: ensure_non_negative("daily_tons", daily_tons)?,
            kwh_per_ton: ensure_non_negative("kwh_per_ton", kwh_per_ton)?,
            temperature_drop_c: None,
        })
    }

    /// Treats the coefficient as kWh/t/degC, scaled by the conditioning drop.
    pub fn with_temperature_drop(mut self, drop_c: f64) -> Result<Self> {
        self.temperature_drop_c = Some(ensure_non_negative("temperature_drop_c", drop_c)?);
        Ok(self)
    }

    pub fn with_daily_tons(mut self, daily_tons: f64) -> Result<Self> {
        self.daily_tons = ensure_non_negative("daily_tons", daily_tons)?;
        Ok(self)
    }

    pub fn daily_tons(&self) -> f64 {
        self.daily_tons
    }

    fn effective_kwh_per_ton(&self) -> f64 {
        self.kwh_per_ton * self.temperature_drop_c.unwrap_or(1.0)
    }
}

/// Which half of the mix/transfer segment comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TilingPhase {
    MixFirst,
    TransferFirst,
}

impl TilingPhase {
    /// Even units start mixing, odd units start transferring.
    pub fn for_index(machine_index: u32) -> Self {
        if machine_index % 2 == 0 {
            TilingPhase::MixFirst
        } else {
            TilingPhase::TransferFirst
        }
    }
}

/// Repeating mix/transfer pattern of a batch mixer. Durations count axis samples,
/// which are minutes on the default axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutyCycleParams {
    daily_tons: f64,
    yield_fraction: f64,
    mix_minutes: usize,
    transfer_minutes: usize,
    kw_per_ton: f64,
}

impl DutyCycleParams {
    pub fn new(
        daily_tons: f64,
        yield_fraction: f64,
        mix_minutes: usize,
        transfer_minutes: usize,
        kw_per_ton: f64,
    ) -> Result<Self> {
        if mix_minutes == 0 {
            return Err(SimError::validation(
                "mix_minutes",
                "mixing time must be greater than zero",
            ));
        }
        if mix_minutes.checked_add(transfer_minutes).is_none() {
            return Err(SimError::validation(
                "transfer_minutes",
                format!("cycle of {mix_minutes} + {transfer_minutes} samples overflows"),
            ));
        }
        Ok(Self {
            daily_tons: ensure_non_negative("daily_tons", daily_tons)?,
            yield_fraction: ensure_unit_fraction("yield_fraction", yield_fraction)?,
            mix_minutes,
            transfer_minutes,
            kw_per_ton: ensure_non_negative("kw_per_ton", kw_per_ton)?,
        })
    }

    pub fn with_daily_tons(mut self, daily_tons: f64) -> Result<Self> {
        self.daily_tons = ensure_non_negative("daily_tons", daily_tons)?;
        Ok(self)
    }

    pub fn cycle_length(&self) -> usize {
        self.mix_minutes + self.transfer_minutes
    }

    pub fn mix_minutes(&self) -> usize {
        self.mix_minutes
    }

    /// Raw material needed for the daily glass output.
    pub fn material_tons(&self) -> f64 {
        self.daily_tons / self.yield_fraction
    }

    /// Tons processed per mixing slot. Summed over the `mix * N / cycle` mixing slots
    /// of the day this equals [`material_tons`](Self::material_tons).
    pub fn batch_size(&self, axis: &TimeAxis) -> f64 {
        let mixing_share = self.mix_minutes as f64 / self.cycle_length() as f64;
        let production_duration = mixing_share * axis.len() as f64;
        self.material_tons() / production_duration
    }
}

/// Anchor curve (e.g. hourly irradiance) scaled to a power output.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveParams {
    anchors: Vec<f64>,
    rated_watts: f64,
    reference: f64,
    performance_ratio: f64,
    interpolation: Interpolation,
}

impl CurveParams {
    pub fn new(
        anchors: Vec<f64>,
        rated_watts: f64,
        reference: f64,
        performance_ratio: f64,
    ) -> Result<Self> {
        if anchors.len() < 2 {
            return Err(SimError::domain("curve needs at least two anchor points"));
        }
        for anchor in &anchors {
            ensure_non_negative("anchors", *anchor)?;
        }
        Ok(Self {
            anchors,
            rated_watts: ensure_non_negative("rated_watts", rated_watts)?,
            reference: ensure_positive("reference", reference)?,
            performance_ratio: ensure_unit_fraction("performance_ratio", performance_ratio)?,
            interpolation: Interpolation::default(),
        })
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn anchors(&self) -> &[f64] {
        &self.anchors
    }

    /// Watts per unit of anchor value.
    pub fn conversion(&self) -> f64 {
        self.rated_watts / self.reference * self.performance_ratio
    }

    /// Anchor positions in hours, evenly spaced over the day starting at hour 0.
    pub fn anchor_hours(&self) -> Vec<f64> {
        let count = self.anchors.len() as f64;
        (0..self.anchors.len())
            .map(|i| i as f64 * HOURS_PER_DAY / count)
            .collect()
    }
}

/// Closed set of shaping archetypes.
#[derive(Debug, Clone, PartialEq)]
pub enum Shaping {
    Constant(ConstantParams),
    Production(ProductionParams),
    DutyCycle(DutyCycleParams),
    Curve(CurveParams),
}

impl Shaping {
    /// Builds the noiseless series; `phase` only affects duty-cycle tiling.
    pub fn shape(&self, axis: &TimeAxis, phase: TilingPhase) -> Result<BaseSeries> {
        match self {
            Shaping::Constant(params) => constant(axis, params),
            Shaping::Production(params) => production_driven(axis, params),
            Shaping::DutyCycle(params) => duty_cycle(axis, params, phase),
            Shaping::Curve(params) => curve_interpolated(axis, params),
        }
    }

    pub fn archetype(&self) -> &'static str {
        match self {
            Shaping::Constant(_) => "constant",
            Shaping::Production(_) => "production-driven",
            Shaping::DutyCycle(_) => "duty-cycle-tiled",
            Shaping::Curve(_) => "curve-interpolated",
        }
    }
}

pub fn constant(axis: &TimeAxis, params: &ConstantParams) -> Result<BaseSeries> {
    BaseSeries::new(vec![params.mean_watts; axis.len()])
}

pub fn production_driven(axis: &TimeAxis, params: &ProductionParams) -> Result<BaseSeries> {
    let samples = axis.len() as f64;
    let tons_per_sample = params.daily_tons / samples;
    let watts = tons_per_sample * params.effective_kwh_per_ton() * samples / HOURS_PER_DAY
        * WATTS_PER_KILOWATT;
    BaseSeries::new(vec![watts; axis.len()])
}

pub fn duty_cycle(
    axis: &TimeAxis,
    params: &DutyCycleParams,
    phase: TilingPhase,
) -> Result<BaseSeries> {
    let cycle = params.cycle_length();
    if cycle > axis.len() {
        return Err(SimError::domain(format!(
            "tiling pattern of {cycle} samples is longer than the {} sample axis",
            axis.len()
        )));
    }
    let batch = params.batch_size(axis);
    let mixing = std::iter::repeat(batch).take(params.mix_minutes);
    let idle = std::iter::repeat(0.0).take(params.transfer_minutes);
    let segment: Vec<f64> = match phase {
        TilingPhase::MixFirst => mixing.chain(idle).collect(),
        TilingPhase::TransferFirst => idle.chain(mixing).collect(),
    };
    let values = segment
        .iter()
        .cycle()
        .take(axis.len())
        .map(|tons| tons * params.kw_per_ton * WATTS_PER_KILOWATT)
        .collect();
    BaseSeries::new(values)
}

pub fn curve_interpolated(axis: &TimeAxis, params: &CurveParams) -> Result<BaseSeries> {
    let resampled =
        params
            .interpolation
            .resample(&params.anchor_hours(), &params.anchors, &axis.hours())?;
    let conversion = params.conversion();
    BaseSeries::new(
        resampled
            .into_iter()
            .map(|v| (v * conversion).max(0.0))
            .collect(),
    )
}
