//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Stock machine profiles of the glass production line."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Physical constants are estimates gathered from public literature on container
//! glass production; they set plausible magnitudes, not measured values.
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::Result;
use crate::noise::NoiseKind;
use crate::scenario::{Aging, Baseline, CulletSavings, MachineProfile};
use crate::series::OutputRounding;
use crate::shaper::{ConstantParams, CurveParams, DutyCycleParams, ProductionParams, Shaping};

/// Hourly global tilted irradiance in W/m², 00:00 to 23:00. Helsinki, May average,
/// 49 degree tilt facing south.
pub const HOURLY_GTI: [f64; 24] = [
    0.0, 0.0, 0.0, 0.0, 1.69, 19.98, 55.87, 180.09, 341.57, 489.86, 632.75, 721.39, 741.11,
    722.58, 647.72, 527.44, 384.08, 239.04, 97.32, 37.89, 9.11, 0.0, 0.0, 0.0,
];

/// Irradiance at standard test conditions, W/m².
pub const STANDARD_IRRADIANCE: f64 = 1000.0;

const FORMING_FAULT_EXCESS: f64 = 0.2;
const LEGACY_FURNACE_SEED_OFFSET: u64 = 42;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum MachineKind {
    /// Legacy constant-draw furnace profile.
    Furnace,
    MeltingFurnace,
    Forehearth,
    FormingMachine,
    LehrOven,
    BatchMixer,
    SolarPanel,
}

impl MachineKind {
    /// Number of healthy units on the reference line.
    pub fn default_units(self) -> u32 {
        match self {
            MachineKind::Forehearth | MachineKind::FormingMachine => 4,
            MachineKind::BatchMixer => 2,
            _ => 1,
        }
    }

    /// Whether the reference line includes an extra faulty unit.
    pub fn default_faulty(self) -> bool {
        matches!(self, MachineKind::FormingMachine)
    }

    pub fn profile(self) -> Result<MachineProfile> {
        let name: &'static str = self.into();
        match self {
            MachineKind::Furnace => Ok(MachineProfile::new(
                name,
                "Glass Furnace Energy Consumption",
                Shaping::Constant(ConstantParams::new(1000.0)?),
            )
            .with_noise(NoiseKind::Additive { reference: None }, 0.01)?
            .with_rounding(OutputRounding::Real)
            .with_seed_offset(LEGACY_FURNACE_SEED_OFFSET)),

            MachineKind::MeltingFurnace => Ok(MachineProfile::new(
                name,
                "Melting Furnace Power Consumption",
                Shaping::Production(ProductionParams::new(400.0, 1100.0)?),
            )
            .with_noise(NoiseKind::Multiplicative, 0.03)?
            .with_baseline(Baseline::new(
                ConstantParams::from_daily_kwh(10_000.0)?,
                0.02,
            )?)
            .with_aging(Aging::new(5.0, 0.02)?)
            .with_cullet(CulletSavings::new(0.4, 0.002)?)
            .with_rounding(OutputRounding::Real)),

            MachineKind::Forehearth => Ok(MachineProfile::new(
                name,
                "Forehearth Power Consumption",
                Shaping::Production(
                    ProductionParams::new(50.0, 0.25)?.with_temperature_drop(50.0)?,
                ),
            )
            .with_noise(NoiseKind::Multiplicative, 0.03)?
            .with_aging(Aging::new(2.0, 0.02)?)),

            MachineKind::FormingMachine => MachineProfile::new(
                name,
                "Forming Machine Power Consumption",
                Shaping::Production(ProductionParams::new(50.0, 160.0)?),
            )
            .with_noise(NoiseKind::Multiplicative, 0.01)?
            .with_fault_excess(FORMING_FAULT_EXCESS),

            MachineKind::LehrOven => Ok(MachineProfile::new(
                name,
                "Lehr Oven Power Consumption",
                Shaping::Production(ProductionParams::new(50.0, 10.0)?),
            )
            .with_noise(NoiseKind::Multiplicative, 0.03)?
            .with_aging(Aging::new(2.0, 0.02)?)
            .with_rounding(OutputRounding::Real)),

            MachineKind::BatchMixer => Ok(MachineProfile::new(
                name,
                "Batch Mixer Power Consumption",
                Shaping::DutyCycle(DutyCycleParams::new(100.0, 0.85, 3, 2, 30.0)?),
            )
            .with_noise(NoiseKind::Multiplicative, 0.03)?),

            MachineKind::SolarPanel => Ok(MachineProfile::new(
                name,
                "Solar Panel Power Production",
                Shaping::Curve(CurveParams::new(
                    HOURLY_GTI.to_vec(),
                    400.0,
                    STANDARD_IRRADIANCE,
                    0.8,
                )?),
            )
            .with_noise(NoiseKind::Multiplicative, 0.05)?
            .with_rounding(OutputRounding::Real)),
        }
    }
}
