//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Persistence and visualization boundary for finished series."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::SinkError;
use crate::series::{PowerSeries, SeriesStats};

pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Axis and value labels for a rendered profile.
#[derive(Debug, Clone, Serialize)]
pub struct PlotLabels {
    pub x: String,
    pub y: String,
}

impl PlotLabels {
    pub fn hour_of_day(y: impl Into<String>) -> Self {
        Self {
            x: "Hour of Day".to_owned(),
            y: y.into(),
        }
    }
}

/// Receives finished series. Writers must keep `name` distinct per unit.
pub trait SeriesSink {
    fn write(&mut self, name: &str, column_label: &str, series: &PowerSeries) -> SinkResult<()>;

    /// Optional rendering hook; the default does nothing.
    fn visualize(
        &mut self,
        _name: &str,
        _series: &PowerSeries,
        _hours: &[f64],
        _title: &str,
        _labels: &PlotLabels,
    ) -> SinkResult<()> {
        Ok(())
    }
}

/// Writes `<name>.csv` files with one labeled column, plus an optional
/// `<name>.plot.json` descriptor per visualized series.
#[derive(Debug, Clone)]
pub struct CsvSink {
    directory: PathBuf,
    plots: bool,
}

impl CsvSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            plots: false,
        }
    }

    pub fn with_plots(mut self, plots: bool) -> Self {
        self.plots = plots;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn csv_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.csv"))
    }

    pub fn plot_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.plot.json"))
    }

    fn ensure_directory(&self) -> SinkResult<()> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory)?;
        }
        Ok(())
    }
}

impl SeriesSink for CsvSink {
    fn write(&mut self, name: &str, column_label: &str, series: &PowerSeries) -> SinkResult<()> {
        self.ensure_directory()?;
        let path = self.csv_path(name);
        let mut writer = csv::Writer::from_writer(File::create(&path)?);
        writer.write_record([column_label])?;
        match series.as_watts() {
            Some(watts) => {
                for value in watts {
                    writer.write_record([value.to_string()])?;
                }
            }
            None => {
                for value in series.values() {
                    writer.write_record([value.to_string()])?;
                }
            }
        }
        writer.flush()?;
        info!(series = %name, rows = series.len(), path = %path.display(), "series written");
        Ok(())
    }

    fn visualize(
        &mut self,
        name: &str,
        series: &PowerSeries,
        hours: &[f64],
        title: &str,
        labels: &PlotLabels,
    ) -> SinkResult<()> {
        if !self.plots {
            return Ok(());
        }
        self.ensure_directory()?;
        let descriptor = PlotDescriptor {
            generated_at: Utc::now().to_rfc3339(),
            title,
            labels,
            stats: series.stats(),
            schema: plot_schema(),
            x: hours,
            y: series.values(),
        };
        let serialized = serde_json::to_string_pretty(&descriptor)?;
        fs::write(self.plot_path(name), serialized)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct PlotDescriptor<'a> {
    generated_at: String,
    title: &'a str,
    labels: &'a PlotLabels,
    stats: SeriesStats,
    schema: serde_json::Value,
    x: &'a [f64],
    y: &'a [f64],
}

fn plot_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "PowerProfilePlot",
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "labels": {
                "type": "object",
                "properties": {"x": {"type": "string"}, "y": {"type": "string"}},
                "required": ["x", "y"]
            },
            "x": {"type": "array", "items": {"type": "number"}},
            "y": {"type": "array", "items": {"type": "number", "minimum": 0}}
        },
        "required": ["title", "labels", "x", "y"]
    })
}

/// Keeps written series in memory, in write order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub written: Vec<(String, String, PowerSeries)>,
    pub visualized: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PowerSeries> {
        self.written
            .iter()
            .find(|(written, _, _)| written == name)
            .map(|(_, _, series)| series)
    }
}

impl SeriesSink for MemorySink {
    fn write(&mut self, name: &str, column_label: &str, series: &PowerSeries) -> SinkResult<()> {
        self.written
            .push((name.to_owned(), column_label.to_owned(), series.clone()));
        Ok(())
    }

    fn visualize(
        &mut self,
        name: &str,
        _series: &PowerSeries,
        _hours: &[f64],
        _title: &str,
        _labels: &PlotLabels,
    ) -> SinkResult<()> {
        self.visualized.push(name.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::OutputRounding;
    use tempfile::tempdir;

    #[test]
    fn csv_sink_writes_single_labeled_column() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut sink = CsvSink::new(dir.path().join("out"));
        let series = PowerSeries::finish(vec![1.4, 2.5, 3.6], OutputRounding::IntegerWatts);
        sink.write("mixer0", "ActivePower", &series)?;

        let contents = fs::read_to_string(sink.csv_path("mixer0"))?;
        assert_eq!(contents, "ActivePower\n1\n2\n4\n");
        Ok(())
    }

    #[test]
    fn csv_sink_keeps_real_values() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut sink = CsvSink::new(dir.path());
        let series = PowerSeries::finish(vec![0.25, 1.5], OutputRounding::Real);
        sink.write("panel", "ActivePower", &series)?;
        let contents = fs::read_to_string(sink.csv_path("panel"))?;
        assert_eq!(contents, "ActivePower\n0.25\n1.5\n");
        Ok(())
    }

    #[test]
    fn plots_are_skipped_unless_enabled() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let series = PowerSeries::finish(vec![1.0, 2.0], OutputRounding::Real);
        let labels = PlotLabels::hour_of_day("Power Consumption (W)");

        let mut quiet = CsvSink::new(dir.path());
        quiet.visualize("quiet", &series, &[0.0, 12.0], "Quiet", &labels)?;
        assert!(!quiet.plot_path("quiet").exists());

        let mut plotting = CsvSink::new(dir.path()).with_plots(true);
        plotting.visualize("loud", &series, &[0.0, 12.0], "Loud", &labels)?;
        let descriptor: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(plotting.plot_path("loud"))?)?;
        assert_eq!(descriptor["title"], "Loud");
        assert_eq!(descriptor["labels"]["x"], "Hour of Day");
        assert_eq!(descriptor["y"].as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[test]
    fn unwritable_destination_surfaces_io_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory")?;
        let mut sink = CsvSink::new(blocker.join("nested"));
        let series = PowerSeries::finish(vec![1.0], OutputRounding::Real);
        let err = sink.write("x", "ActivePower", &series).unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
        Ok(())
    }

    #[test]
    fn memory_sink_records_writes() {
        let mut sink = MemorySink::new();
        let series = PowerSeries::finish(vec![1.0], OutputRounding::Real);
        sink.write("a", "ActivePower", &series).unwrap();
        assert_eq!(sink.get("a"), Some(&series));
        assert!(sink.get("b").is_none());
    }
}
