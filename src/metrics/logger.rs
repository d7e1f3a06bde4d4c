use super::{MetricsSnapshot, Reporter};
use crate::simulation::World;
use anyhow::{anyhow, Result};
use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// CSV sink for metrics snapshots, one row per polled step. Also usable as a
/// `Reporter` to stream rows while the run is in progress.
pub struct MetricsLogger<W: Write = File> {
    writer: Writer<W>,
    rows: usize,
}

impl MetricsLogger<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::wrap(Writer::from_path(path)?))
    }
}

impl<W: Write> MetricsLogger<W> {
    pub fn from_writer(sink: W) -> Self {
        Self::wrap(Writer::from_writer(sink))
    }

    fn wrap(writer: Writer<W>) -> Self {
        Self { writer, rows: 0 }
    }

    /// Rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn log(&mut self, snapshot: &MetricsSnapshot) -> Result<()> {
        self.writer.serialize(snapshot)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn log_all<'a>(
        &mut self,
        snapshots: impl IntoIterator<Item = &'a MetricsSnapshot>,
    ) -> Result<usize> {
        let before = self.rows;
        for snapshot in snapshots {
            self.writer.serialize(snapshot)?;
            self.rows += 1;
        }
        self.writer.flush()?;
        Ok(self.rows - before)
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow!("flushing metrics csv: {}", e.error()))
    }
}

impl<W: Write> Reporter for MetricsLogger<W> {
    fn report(&mut self, world: &World) {
        if let Err(e) = self.log(&MetricsSnapshot::capture(world)) {
            warn!("Dropping metrics row for step {}: {}", world.time(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimConfig;

    const HEADER: &str = "step,welfare,density,clustering,num_components,num_edges";

    fn snapshot(step: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            step,
            welfare: 1.5,
            density: 0.25,
            clustering: 0.0,
            num_components: 2,
            num_edges: 1,
        }
    }

    #[test]
    fn writes_header_once() {
        let mut logger = MetricsLogger::from_writer(Vec::new());
        assert_eq!(logger.log_all(&[snapshot(0), snapshot(1)]).unwrap(), 2);
        logger.log(&snapshot(2)).unwrap();
        assert_eq!(logger.rows(), 3);

        let content = String::from_utf8(logger.into_inner().unwrap()).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(HEADER));
        let row = lines.next().unwrap();
        assert!(row.starts_with("0,1.5,0.25,"), "unexpected row {row}");
        assert!(row.ends_with(",2,1"), "unexpected row {row}");
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn streams_rows_while_the_world_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let config = SimConfig {
            num_agents: 4,
            polling_interval: 2,
            max_steps: Some(5),
            defer_stability_to_cap: true,
            ..SimConfig::default()
        };
        let mut world = World::new(config).unwrap();
        world.add_reporter(Box::new(MetricsLogger::create(&path).unwrap()));
        world.run();

        let content = std::fs::read_to_string(&path).unwrap();
        let steps: Vec<&str> = content
            .lines()
            .skip(1)
            .filter_map(|row| row.split(',').next())
            .collect();
        assert_eq!(steps, vec!["0", "2", "4"]);
    }
}
