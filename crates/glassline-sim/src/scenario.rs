//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Machine profile composition: shaping, multipliers and noise."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Multipliers are applied to the noiseless components in a fixed order
//! (cullet savings on the production component, then aging, then the fault
//! excess) before any noise is drawn. The fault excess scales the summed
//! noiseless profile, so a faulty unit's expected power is exactly the healthy
//! one times the multiplier.
use tracing::debug;

use crate::axis::TimeAxis;
use crate::error::{ensure_non_negative, ensure_positive, Result, SimError};
use crate::noise::{inject_with, NoiseKind};
use crate::rng::{seed_for, NoiseStream, DEFAULT_SEED_OFFSET};
use crate::series::{BaseSeries, OutputRounding, PowerSeries};
use crate::shaper::{ConstantParams, Shaping, TilingPhase};

/// Linear year-on-year consumption increase from wear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aging {
    age_years: f64,
    factor_per_year: f64,
}

impl Aging {
    pub fn new(age_years: f64, factor_per_year: f64) -> Result<Self> {
        Ok(Self {
            age_years: ensure_non_negative("age_years", age_years)?,
            factor_per_year: ensure_non_negative("aging_factor", factor_per_year)?,
        })
    }

    pub fn multiplier(&self) -> f64 {
        1.0 + self.age_years * self.factor_per_year
    }
}

/// Melting energy saved by recycled glass in the batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CulletSavings {
    fraction: f64,
    savings_per_percent: f64,
}

impl CulletSavings {
    /// Rejects combinations whose multiplier `1 - 100 * fraction * savings` is negative.
    pub fn new(fraction: f64, savings_per_percent: f64) -> Result<Self> {
        let fraction = ensure_non_negative("cullet_fraction", fraction)?;
        if fraction > 1.0 {
            return Err(SimError::validation(
                "cullet_fraction",
                format!("{fraction} exceeds 1"),
            ));
        }
        let savings = Self {
            fraction,
            savings_per_percent: ensure_non_negative("cullet_savings", savings_per_percent)?,
        };
        if savings.multiplier() < 0.0 {
            return Err(SimError::validation(
                "cullet_savings",
                format!(
                    "savings multiplier {} would be negative",
                    savings.multiplier()
                ),
            ));
        }
        Ok(savings)
    }

    pub fn multiplier(&self) -> f64 {
        1.0 - 100.0 * self.fraction * self.savings_per_percent
    }
}

/// Idle consumption drawn regardless of production, with its own variability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    params: ConstantParams,
    relative_std_dev: f64,
}

impl Baseline {
    pub fn new(params: ConstantParams, relative_std_dev: f64) -> Result<Self> {
        Ok(Self {
            params,
            relative_std_dev: ensure_non_negative("baseline_variability", relative_std_dev)?,
        })
    }
}

/// Optional modifiers of a single generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantFlags {
    pub faulty: bool,
    /// Overrides the index-derived duty-cycle phase.
    pub phase: Option<TilingPhase>,
}

impl VariantFlags {
    pub fn faulty() -> Self {
        Self {
            faulty: true,
            phase: None,
        }
    }
}

/// One unit to generate for a machine type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitRequest {
    pub machine_index: u32,
    pub flags: VariantFlags,
}

/// Everything needed to turn a machine index into a power profile.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineProfile {
    name: String,
    title: String,
    shaping: Shaping,
    noise_kind: NoiseKind,
    relative_std_dev: f64,
    baseline: Option<Baseline>,
    aging: Option<Aging>,
    cullet: Option<CulletSavings>,
    fault_multiplier: Option<f64>,
    rounding: OutputRounding,
    seed_offset: u64,
}

impl MachineProfile {
    pub fn new(name: impl Into<String>, title: impl Into<String>, shaping: Shaping) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            shaping,
            noise_kind: NoiseKind::Multiplicative,
            relative_std_dev: 0.0,
            baseline: None,
            aging: None,
            cullet: None,
            fault_multiplier: None,
            rounding: OutputRounding::IntegerWatts,
            seed_offset: DEFAULT_SEED_OFFSET,
        }
    }

    pub fn with_noise(mut self, kind: NoiseKind, relative_std_dev: f64) -> Result<Self> {
        self.noise_kind = kind;
        self.relative_std_dev = ensure_non_negative("variability", relative_std_dev)?;
        Ok(self)
    }

    pub fn with_variability(self, relative_std_dev: f64) -> Result<Self> {
        let kind = self.noise_kind;
        self.with_noise(kind, relative_std_dev)
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn with_aging(mut self, aging: Aging) -> Self {
        self.aging = Some(aging);
        self
    }

    /// Replaces the age of an existing aging overlay.
    pub fn with_age_years(mut self, age_years: f64) -> Result<Self> {
        let aging = self.aging.ok_or_else(|| {
            SimError::validation("age_years", format!("{} does not model aging", self.name))
        })?;
        self.aging = Some(Aging::new(age_years, aging.factor_per_year)?);
        Ok(self)
    }

    pub fn with_cullet(mut self, cullet: CulletSavings) -> Self {
        self.cullet = Some(cullet);
        self
    }

    /// `excess` is the fractional increase of a faulty unit, e.g. `0.2` for +20%.
    pub fn with_fault_excess(mut self, excess: f64) -> Result<Self> {
        self.fault_multiplier = Some(1.0 + ensure_positive("fault_excess", excess)?);
        Ok(self)
    }

    pub fn with_rounding(mut self, rounding: OutputRounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_seed_offset(mut self, seed_offset: u64) -> Self {
        self.seed_offset = seed_offset;
        self
    }

    pub fn with_daily_tons(mut self, daily_tons: f64) -> Result<Self> {
        self.shaping = match self.shaping {
            Shaping::Production(params) => Shaping::Production(params.with_daily_tons(daily_tons)?),
            Shaping::DutyCycle(params) => Shaping::DutyCycle(params.with_daily_tons(daily_tons)?),
            other => {
                return Err(SimError::validation(
                    "daily_tons",
                    format!("{} profiles have no production quantity", other.archetype()),
                ))
            }
        };
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn shaping(&self) -> &Shaping {
        &self.shaping
    }

    pub fn relative_std_dev(&self) -> f64 {
        self.relative_std_dev
    }

    pub fn seed_offset(&self) -> u64 {
        self.seed_offset
    }

    /// `None` when the profile has no fault variant.
    pub fn fault_multiplier(&self) -> Option<f64> {
        self.fault_multiplier
    }

    /// Multiplier for the requested variant; faulty requests need a fault excess.
    fn fault_factor(&self, flags: VariantFlags) -> Result<f64> {
        if !flags.faulty {
            return Ok(1.0);
        }
        self.fault_multiplier.ok_or_else(|| {
            SimError::validation(
                "faulty",
                format!("{} has no fault excess configured", self.name),
            )
        })
    }

    pub fn seed(&self, machine_index: u32) -> u64 {
        seed_for(self.seed_offset, machine_index)
    }

    /// Healthy units `0..count`, followed by one faulty unit at index `count` if asked.
    pub fn units(&self, count: u32, with_faulty: bool) -> Vec<UnitRequest> {
        let mut units: Vec<UnitRequest> = (0..count)
            .map(|machine_index| UnitRequest {
                machine_index,
                flags: VariantFlags::default(),
            })
            .collect();
        if with_faulty {
            units.push(UnitRequest {
                machine_index: count,
                flags: VariantFlags::faulty(),
            });
        }
        units
    }

    /// Output identifier: the bare name for a lone healthy unit, otherwise name plus
    /// index, with a `_faulty` suffix for fault variants.
    pub fn output_name(&self, machine_index: u32, flags: VariantFlags, numbered: bool) -> String {
        let mut name = if numbered || flags.faulty {
            format!("{}{}", self.name, machine_index)
        } else {
            self.name.clone()
        };
        if flags.faulty {
            name.push_str("_faulty");
        }
        name
    }

    /// Healthy noiseless components in noise-draw order: baseline first, then production.
    fn components(
        &self,
        axis: &TimeAxis,
        machine_index: u32,
        flags: VariantFlags,
    ) -> Result<Vec<(BaseSeries, f64, NoiseKind)>> {
        let phase = flags
            .phase
            .unwrap_or_else(|| TilingPhase::for_index(machine_index));
        let mut primary = self.shaping.shape(axis, phase)?;
        if let Some(cullet) = &self.cullet {
            primary = primary.scaled(cullet.multiplier())?;
        }

        let mut components = Vec::with_capacity(2);
        if let Some(baseline) = &self.baseline {
            let base = crate::shaper::constant(axis, &baseline.params)?;
            components.push((base, baseline.relative_std_dev, NoiseKind::Multiplicative));
        }
        components.push((primary, self.relative_std_dev, self.noise_kind));

        let aging = self.aging.map(|a| a.multiplier()).unwrap_or(1.0);
        components
            .into_iter()
            .map(|(series, sd, kind)| Ok((series.scaled(aging)?, sd, kind)))
            .collect()
    }

    /// Noiseless expected power after every multiplier.
    pub fn noiseless(
        &self,
        axis: &TimeAxis,
        machine_index: u32,
        flags: VariantFlags,
    ) -> Result<BaseSeries> {
        let fault = self.fault_factor(flags)?;
        let components = self.components(axis, machine_index, flags)?;
        BaseSeries::new(sum_components(
            axis.len(),
            components.iter().map(|(series, _, _)| series.values()),
        ))?
        .scaled(fault)
    }

    /// Produces the finished profile for one unit. Pure in its inputs.
    pub fn generate(
        &self,
        axis: &TimeAxis,
        machine_index: u32,
        flags: VariantFlags,
    ) -> Result<PowerSeries> {
        let fault = self.fault_factor(flags)?;
        let components = self.components(axis, machine_index, flags)?;
        let seed = self.seed(machine_index);
        debug!(
            machine = %self.name,
            machine_index,
            seed,
            faulty = flags.faulty,
            archetype = self.shaping.archetype(),
            "generating power profile"
        );

        let mut stream = NoiseStream::new(seed);
        let noisy = components
            .iter()
            .map(|(series, sd, kind)| {
                inject_with(&mut stream, &series.scaled(fault)?, *sd, *kind)
            })
            .collect::<Result<Vec<_>>>()?;
        let total = sum_components(axis.len(), noisy.iter().map(Vec::as_slice));
        Ok(PowerSeries::finish(total, self.rounding))
    }
}

fn sum_components<'a>(len: usize, parts: impl Iterator<Item = &'a [f64]>) -> Vec<f64> {
    let mut total = vec![0.0; len];
    for part in parts {
        for (acc, value) in total.iter_mut().zip(part) {
            *acc += value;
        }
    }
    total
}
