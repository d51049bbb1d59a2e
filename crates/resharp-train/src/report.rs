use crate::error::TrainError;
use resharp_core::Tensor;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Scalar errors of one iteration, with enough context to format a line or
/// plot a point.
pub struct ErrorReport<'a> {
    pub epoch: usize,
    pub total_epochs: usize,
    pub epoch_iter: usize,
    pub dataset_size: usize,
    pub errors: &'a [(String, f64)],
    pub sec_per_item: f64,
}

/// Visualization / monitoring collaborator. The orchestrator pushes visuals,
/// scalar errors and epoch summaries; what happens to them (terminal, file,
/// live plot) is the sink's business.
pub trait ReportSink {
    fn display_visuals(
        &mut self,
        visuals: &[(String, Tensor)],
        epoch: usize,
    ) -> Result<(), TrainError>;

    fn print_errors(&mut self, report: &ErrorReport<'_>) -> Result<(), TrainError>;

    /// Whether per-metric plot points should be forwarded.
    fn plot_enabled(&self) -> bool {
        false
    }

    /// One plot point per metric, with epoch progress in [0, 1).
    fn plot_errors(
        &mut self,
        _epoch: usize,
        _progress: f64,
        _errors: &[(String, f64)],
    ) -> Result<(), TrainError> {
        Ok(())
    }

    fn end_of_epoch(
        &mut self,
        _epoch: usize,
        _total_epochs: usize,
        _elapsed: Duration,
    ) -> Result<(), TrainError> {
        Ok(())
    }
}

/// Terminal sink mirroring the classic training log lines.
#[derive(Default)]
pub struct ConsoleReport;

impl ReportSink for ConsoleReport {
    fn display_visuals(
        &mut self,
        visuals: &[(String, Tensor)],
        epoch: usize,
    ) -> Result<(), TrainError> {
        for (name, t) in visuals {
            println!("epoch {epoch}: {name} {t}");
        }
        Ok(())
    }

    fn print_errors(&mut self, report: &ErrorReport<'_>) -> Result<(), TrainError> {
        let mut line = format!(
            "(epoch: {}/{}, iters: {}/{}, time: {:.3})",
            report.epoch,
            report.total_epochs,
            report.epoch_iter,
            report.dataset_size,
            report.sec_per_item
        );
        for (name, value) in report.errors {
            line.push_str(&format!(" {name}: {value:.3}"));
        }
        println!("{line}");
        Ok(())
    }

    fn end_of_epoch(
        &mut self,
        epoch: usize,
        total_epochs: usize,
        elapsed: Duration,
    ) -> Result<(), TrainError> {
        println!(
            "End of epoch {} / {} \t Time Taken: {} sec",
            epoch,
            total_epochs,
            elapsed.as_secs()
        );
        Ok(())
    }
}

/// Machine-readable sink: one CSV row per metric per reported iteration.
pub struct CsvErrorLog {
    writer: csv::Writer<File>,
}

impl CsvErrorLog {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TrainError> {
        let mut writer =
            csv::Writer::from_path(path).map_err(|e| TrainError::Report(e.to_string()))?;
        writer
            .write_record(["epoch", "iter", "metric", "value"])
            .map_err(|e| TrainError::Report(e.to_string()))?;
        Ok(CsvErrorLog { writer })
    }

    fn write(&mut self, epoch: usize, iter: usize, name: &str, value: f64) -> Result<(), TrainError> {
        self.writer
            .write_record([
                epoch.to_string(),
                iter.to_string(),
                name.to_string(),
                value.to_string(),
            ])
            .map_err(|e| TrainError::Report(e.to_string()))
    }
}

impl ReportSink for CsvErrorLog {
    fn display_visuals(
        &mut self,
        _visuals: &[(String, Tensor)],
        _epoch: usize,
    ) -> Result<(), TrainError> {
        Ok(())
    }

    fn print_errors(&mut self, report: &ErrorReport<'_>) -> Result<(), TrainError> {
        for (name, value) in report.errors {
            self.write(report.epoch, report.epoch_iter, name, *value)?;
        }
        self.writer
            .flush()
            .map_err(|e| TrainError::Report(e.to_string()))
    }
}
