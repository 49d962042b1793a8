//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "integration-tests"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "End-to-end properties of generated power profiles."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use glassline_sim::{
    inject, CsvSink, DutyCycleParams, MachineKind, MachineProfile, MemorySink, NoiseKind,
    NoiseSpec, PlotLabels, ProductionParams, SeriesSink, Shaping, SimError, TilingPhase,
    TimeAxis, VariantFlags,
};
use strum::IntoEnumIterator;
use tempfile::tempdir;

fn forming_profile() -> MachineProfile {
    MachineProfile::new(
        "forming_machine",
        "Forming Machine",
        Shaping::Production(ProductionParams::new(50.0, 160.0).unwrap()),
    )
    .with_noise(NoiseKind::Multiplicative, 0.03)
    .unwrap()
}

#[test]
fn every_catalog_unit_is_deterministic_and_non_negative() {
    let axis = TimeAxis::default();
    for kind in MachineKind::iter() {
        let profile = kind.profile().unwrap();
        for unit in profile.units(kind.default_units(), kind.default_faulty()) {
            let first = profile
                .generate(&axis, unit.machine_index, unit.flags)
                .unwrap();
            let second = profile
                .generate(&axis, unit.machine_index, unit.flags)
                .unwrap();
            assert_eq!(first, second, "{kind} unit {}", unit.machine_index);
            assert_eq!(first.len(), axis.len());
            assert!(first.values().iter().all(|v| *v >= 0.0));
        }
    }
}

#[test]
fn length_holds_when_period_does_not_divide_axis() {
    let axis = TimeAxis::new(1001).unwrap();
    let profile = MachineKind::BatchMixer.profile().unwrap();
    let series = profile.generate(&axis, 1, VariantFlags::default()).unwrap();
    assert_eq!(series.len(), 1001);
}

#[test]
fn tiled_batches_conserve_daily_material() {
    let axis = TimeAxis::default();
    let params = DutyCycleParams::new(100.0, 0.85, 3, 2, 30.0).unwrap();
    let batch = params.batch_size(&axis);
    let material = 100.0 / 0.85;
    let cycles = axis.len() as f64 / params.cycle_length() as f64;
    assert!((batch * 3.0 * cycles - material).abs() < 1e-9);

    let profile = MachineProfile::new("batch_mixer", "Batch Mixer", Shaping::DutyCycle(params));
    let base = profile
        .noiseless(&axis, 0, VariantFlags::default())
        .unwrap();
    let mixed_tons: f64 = base.values().iter().map(|w| w / (30.0 * 1000.0)).sum();
    assert!((mixed_tons - material).abs() < 1e-6);
}

#[test]
fn idle_slots_stay_zero_after_noise() {
    let axis = TimeAxis::default();
    let profile = MachineKind::BatchMixer.profile().unwrap();
    for index in 0..2 {
        let base = profile
            .noiseless(&axis, index, VariantFlags::default())
            .unwrap();
        let series = profile
            .generate(&axis, index, VariantFlags::default())
            .unwrap();
        for (b, v) in base.values().iter().zip(series.values()) {
            if *b == 0.0 {
                assert_eq!(*v, 0.0);
            }
        }
    }
}

#[test]
fn odd_mixers_start_with_transfer() {
    let axis = TimeAxis::default();
    let profile = MachineKind::BatchMixer.profile().unwrap();
    let odd = profile
        .noiseless(&axis, 1, VariantFlags::default())
        .unwrap();
    assert_eq!(&odd.values()[..2], &[0.0, 0.0]);
    let forced = profile
        .noiseless(
            &axis,
            1,
            VariantFlags {
                faulty: false,
                phase: Some(TilingPhase::MixFirst),
            },
        )
        .unwrap();
    assert!(forced.values()[0] > 0.0);
}

#[test]
fn curve_hits_anchor_values_without_noise() {
    let axis = TimeAxis::default();
    let profile = MachineKind::SolarPanel.profile().unwrap();
    let base = profile
        .noiseless(&axis, 0, VariantFlags::default())
        .unwrap();
    let conversion = 400.0 / 1000.0 * 0.8;
    for (hour, gti) in glassline_sim::catalog::HOURLY_GTI.iter().enumerate() {
        let value = base.values()[hour * 60];
        assert!((value - gti * conversion).abs() < 1e-9, "hour {hour}");
    }
}

#[test]
fn forming_scenario_reproduces_integer_series() {
    let axis = TimeAxis::default();
    let profile = forming_profile();
    assert_eq!(profile.seed(0), 48);
    let a = profile.generate(&axis, 0, VariantFlags::default()).unwrap();
    let b = profile.generate(&axis, 0, VariantFlags::default()).unwrap();
    assert_eq!(a.as_watts(), b.as_watts());
    assert!(a.values().iter().all(|v| v.fract() == 0.0));
}

#[test]
fn forming_scenario_prefix_is_pinned_for_seed_48() {
    let axis = TimeAxis::default();
    let series = forming_profile()
        .generate(&axis, 0, VariantFlags::default())
        .unwrap();
    let watts = series.as_watts().unwrap();
    assert_eq!(
        &watts[..8],
        &[328021, 326365, 355270, 336950, 326342, 323306, 329941, 327145]
    );
}

#[test]
fn forming_scenario_mean_matches_throughput() {
    let axis = TimeAxis::default();
    let profile = forming_profile();
    let expected = 50.0 * 160.0 / 24.0 * 1000.0;
    let mut total = 0.0;
    let runs = 16;
    for index in 0..runs {
        let series = profile
            .generate(&axis, index, VariantFlags::default())
            .unwrap();
        total += series.stats().mean_w;
    }
    let mean = total / runs as f64;
    assert!((mean - expected).abs() / expected < 0.02, "mean {mean}");
}

#[test]
fn fault_overlay_scales_before_noise() {
    let axis = TimeAxis::default();
    let profile = MachineKind::FormingMachine.profile().unwrap();
    let healthy = profile
        .noiseless(&axis, 4, VariantFlags::default())
        .unwrap();
    let faulty = profile.noiseless(&axis, 4, VariantFlags::faulty()).unwrap();
    assert_eq!(profile.fault_multiplier(), Some(1.2));
    assert!(healthy
        .values()
        .iter()
        .zip(faulty.values())
        .all(|(h, f)| *f == h * 1.2));
}

#[test]
fn fault_overlay_covers_baseline_component() {
    let axis = TimeAxis::default();
    let profile = MachineKind::MeltingFurnace
        .profile()
        .unwrap()
        .with_fault_excess(0.2)
        .unwrap();
    let healthy = profile
        .noiseless(&axis, 1, VariantFlags::default())
        .unwrap();
    let faulty = profile.noiseless(&axis, 1, VariantFlags::faulty()).unwrap();
    let mismatched = healthy
        .values()
        .iter()
        .zip(faulty.values())
        .filter(|(h, f)| **f != *h * 1.2)
        .count();
    assert_eq!(mismatched, 0);
}

#[test]
fn faulty_unit_needs_a_fault_excess() {
    let axis = TimeAxis::default();
    let profile = MachineKind::LehrOven.profile().unwrap();
    let err = profile
        .generate(&axis, 1, VariantFlags::faulty())
        .unwrap_err();
    assert!(matches!(err, SimError::Validation { field: "faulty", .. }));
}

#[test]
fn invalid_parameters_fail_before_sampling() {
    let err = DutyCycleParams::new(100.0, 0.0, 3, 2, 30.0).unwrap_err();
    assert!(matches!(err, SimError::Validation { .. }));

    let base = forming_profile()
        .noiseless(&TimeAxis::default(), 0, VariantFlags::default())
        .unwrap();
    let err = inject(&base, &NoiseSpec::multiplicative(-0.01, 48)).unwrap_err();
    assert!(matches!(err, SimError::Validation { .. }));
}

#[test]
fn sinks_receive_distinct_names() -> anyhow::Result<()> {
    let axis = TimeAxis::default();
    let profile = MachineKind::FormingMachine.profile()?;
    let units = profile.units(4, true);
    let mut memory = MemorySink::new();
    let dir = tempdir()?;
    let mut csv = CsvSink::new(dir.path()).with_plots(true);
    let labels = PlotLabels::hour_of_day("Power Consumption (W)");
    for unit in &units {
        let series = profile.generate(&axis, unit.machine_index, unit.flags)?;
        let name = profile.output_name(unit.machine_index, unit.flags, true);
        memory.write(&name, "ActivePower", &series)?;
        csv.write(&name, "ActivePower", &series)?;
        csv.visualize(&name, &series, &axis.hours(), profile.title(), &labels)?;
    }
    assert_eq!(memory.written.len(), 5);
    assert!(memory.get("forming_machine4_faulty").is_some());
    let rows = std::fs::read_to_string(csv.csv_path("forming_machine0"))?;
    assert_eq!(rows.lines().count(), 1441);
    assert_eq!(rows.lines().next(), Some("ActivePower"));
    assert!(csv.plot_path("forming_machine4_faulty").exists());
    Ok(())
}
