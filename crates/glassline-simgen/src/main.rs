//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "01-bootstrap"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Command line generator for glass-line machine power profiles."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use glassline_common::{init_tracing, AppConfig, MachineConfig};
use glassline_sim::{
    CsvSink, MachineKind, MachineProfile, PlotLabels, PowerSeries, SeriesSink, TimeAxis,
    UnitRequest,
};
use strum::IntoEnumIterator;
use tokio::task::JoinSet;
use tracing::{info, warn};

const SERVICE_NAME: &str = "glassline-simgen";
const CONFIG_CANDIDATES: [&str; 2] = ["glassline.toml", "configs/glassline.toml"];

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate daily power profiles for the machines of a glass production line",
    long_about = None
)]
struct Cli {
    /// Configuration file. Defaults to GLASSLINE_CONFIG or ./glassline.toml when present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for the generated CSV files
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Samples per day (1440 = one per minute)
    #[arg(long)]
    samples: Option<usize>,

    /// Only generate these machine types (repeatable)
    #[arg(long = "machine", value_name = "KIND")]
    machines: Vec<String>,

    /// Write a plot descriptor next to every CSV file
    #[arg(long)]
    plots: bool,

    /// Print the machine catalog and exit
    #[arg(long)]
    list: bool,
}

/// One unit scheduled for generation.
#[derive(Debug, Clone)]
struct PlannedUnit {
    kind: MachineKind,
    profile: Arc<MachineProfile>,
    request: UnitRequest,
    name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.list {
        print_catalog()?;
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    init_tracing(SERVICE_NAME, &config.logging)?;

    let axis = TimeAxis::new(config.generation.samples)?;
    let plan = build_plan(&config, &cli.machines)?;
    info!(units = plan.len(), samples = axis.len(), "generation planned");

    let generated = generate_all(axis, &plan).await?;
    let mut sink = CsvSink::new(&config.output.directory).with_plots(config.output.plots);
    write_all(&mut sink, &axis, &config.generation.column_label, &plan, &generated)?;

    info!(
        units = plan.len(),
        directory = %config.output.directory.display(),
        "power profiles generated"
    );
    Ok(())
}

fn print_catalog() -> Result<()> {
    for kind in MachineKind::iter() {
        let profile = kind.profile()?;
        println!(
            "{:<16} {:<19} units={} faulty={} variability={} seed_offset={}",
            kind,
            profile.shaping().archetype(),
            kind.default_units(),
            kind.default_faulty(),
            profile.relative_std_dev(),
            profile.seed_offset(),
        );
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::load_or_default(&CONFIG_CANDIDATES)?,
    };
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
    if let Some(samples) = cli.samples {
        config.generation.samples = samples;
    }
    if cli.plots {
        config.output.plots = true;
    }
    config.validate()?;
    Ok(config)
}

/// Expand the configured machines (or the whole catalog) into units, in order.
fn build_plan(config: &AppConfig, only: &[String]) -> Result<Vec<PlannedUnit>> {
    let mut selected: Vec<(MachineKind, MachineConfig)> = if config.machines.is_empty() {
        MachineKind::iter()
            .map(|kind| (kind, MachineConfig::default()))
            .collect()
    } else {
        config
            .machines
            .iter()
            .map(|(name, machine)| -> Result<(MachineKind, MachineConfig)> {
                Ok((parse_kind(name)?, machine.clone()))
            })
            .collect::<Result<_>>()?
    };

    if !only.is_empty() {
        let wanted = only
            .iter()
            .map(|name| parse_kind(name))
            .collect::<Result<Vec<_>>>()?;
        selected.retain(|(kind, _)| wanted.contains(kind));
        if selected.is_empty() {
            return Err(anyhow!(
                "none of the requested machines are configured: {}",
                only.join(", ")
            ));
        }
    }

    let mut plan = Vec::new();
    for (kind, machine) in selected {
        let profile = Arc::new(
            configure_profile(kind, &machine)
                .with_context(|| format!("invalid overrides for machine {}", kind))?,
        );
        let count = machine.count.unwrap_or_else(|| kind.default_units());
        let faulty = machine.faulty.unwrap_or_else(|| kind.default_faulty());
        if faulty && profile.fault_multiplier().is_none() {
            return Err(anyhow!(
                "machines.{} requests a faulty unit but has no fault_excess",
                kind
            ));
        }
        let numbered = count + u32::from(faulty) > 1;
        for request in profile.units(count, faulty) {
            let name = profile.output_name(request.machine_index, request.flags, numbered);
            plan.push(PlannedUnit {
                kind,
                profile: Arc::clone(&profile),
                request,
                name,
            });
        }
    }
    Ok(plan)
}

fn parse_kind(name: &str) -> Result<MachineKind> {
    MachineKind::from_str(name).map_err(|_| {
        anyhow!(
            "unknown machine '{}'; expected one of: {}",
            name,
            MachineKind::iter()
                .map(|kind| kind.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn configure_profile(kind: MachineKind, machine: &MachineConfig) -> Result<MachineProfile> {
    let mut profile = kind.profile()?;
    if let Some(variability) = machine.variability {
        profile = profile.with_variability(variability)?;
    }
    if let Some(seed_offset) = machine.seed_offset {
        profile = profile.with_seed_offset(seed_offset);
    }
    if let Some(daily_tons) = machine.daily_tons {
        profile = profile.with_daily_tons(daily_tons)?;
    }
    if let Some(age_years) = machine.age_years {
        profile = profile.with_age_years(age_years)?;
    }
    if let Some(excess) = machine.fault_excess {
        profile = profile.with_fault_excess(excess)?;
    }
    Ok(profile)
}

/// Runs every unit on its own blocking task; results come back in plan order.
async fn generate_all(axis: TimeAxis, plan: &[PlannedUnit]) -> Result<Vec<PowerSeries>> {
    let mut tasks = JoinSet::new();
    for (position, unit) in plan.iter().enumerate() {
        let profile = Arc::clone(&unit.profile);
        let request = unit.request;
        tasks.spawn_blocking(move || {
            (
                position,
                profile.generate(&axis, request.machine_index, request.flags),
            )
        });
    }

    let mut slots: Vec<Option<PowerSeries>> = vec![None; plan.len()];
    while let Some(joined) = tasks.join_next().await {
        let (position, generated) = joined.context("generation task panicked")?;
        let series = generated
            .with_context(|| format!("failed to generate {}", plan[position].name))?;
        slots[position] = Some(series);
    }
    slots
        .into_iter()
        .zip(plan)
        .map(|(slot, unit)| slot.ok_or_else(|| anyhow!("no result for {}", unit.name)))
        .collect()
}

fn write_all(
    sink: &mut impl SeriesSink,
    axis: &TimeAxis,
    column_label: &str,
    plan: &[PlannedUnit],
    generated: &[PowerSeries],
) -> Result<()> {
    let hours = axis.hours();
    for (unit, series) in plan.iter().zip(generated) {
        sink.write(&unit.name, column_label, series)
            .with_context(|| format!("failed to write {}", unit.name))?;

        let stats = series.stats();
        info!(
            series = %unit.name,
            mean_w = stats.mean_w,
            std_dev_w = stats.std_dev_w,
            min_w = stats.min_w,
            max_w = stats.max_w,
            energy_kwh = stats.energy_kwh,
            "series summary"
        );

        let title = format!("{} ({})", unit.profile.title(), unit.name);
        if let Err(err) = sink.visualize(&unit.name, series, &hours, &title, &y_label(unit.kind))
        {
            warn!(series = %unit.name, error = %err, "visualization failed; continuing");
        }
    }
    Ok(())
}

fn y_label(kind: MachineKind) -> PlotLabels {
    match kind {
        MachineKind::SolarPanel => PlotLabels::hour_of_day("Power Production (W)"),
        _ => PlotLabels::hour_of_day("Power Consumption (W)"),
    }
}
