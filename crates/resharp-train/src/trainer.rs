use crate::checkpoint::CheckpointTag;
use crate::error::TrainError;
use crate::model::{BatchSource, Model};
use crate::report::{ErrorReport, ReportSink};
use std::time::Instant;

/// Scheduling knobs of a training session.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// First epoch index; above 1 when resuming.
    pub epoch_count: usize,
    /// Epochs at the initial learning rate.
    pub niter: usize,
    /// Additional epochs over which the rate decays to zero.
    pub niter_decay: usize,
    /// Samples per batch, used to advance the step counters.
    pub batch_size: usize,
    /// Push visuals to the sink every this many steps.
    pub display_freq: usize,
    /// Report scalar errors every this many steps.
    pub print_freq: usize,
    /// Write a "latest" checkpoint every this many steps.
    pub save_latest_freq: usize,
    /// Write "latest" plus an epoch-tagged checkpoint every this many epochs.
    pub save_epoch_freq: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            epoch_count: 1,
            niter: 100,
            niter_decay: 100,
            batch_size: 1,
            display_freq: 100,
            print_freq: 100,
            save_latest_freq: 100,
            save_epoch_freq: 5,
        }
    }
}

/// Where the orchestrator currently is in its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    EpochRunning,
    IterationRunning,
    Checkpointing,
    Decaying,
    Terminated,
}

/// Drives the epoch/iteration loop: feeds batches into the model
/// collaborator, fires the periodic side-effect triggers and the end-of-epoch
/// checkpoint and decay steps.
///
/// Epochs run in increasing order, iterations in loader order; the first
/// error from any collaborator halts the loop.
pub struct TrainingOrchestrator {
    opts: TrainOptions,
    phase: Phase,
    total_steps: usize,
}

impl TrainingOrchestrator {
    pub fn new(opts: TrainOptions) -> Self {
        TrainingOrchestrator {
            opts,
            phase: Phase::Idle,
            total_steps: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Steps taken so far, counted in samples.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    fn due(&self, freq: usize) -> bool {
        freq > 0 && self.total_steps % freq == 0
    }

    pub fn run<M, S, R>(
        &mut self,
        model: &mut M,
        source: &mut S,
        report: &mut R,
    ) -> Result<(), TrainError>
    where
        M: Model,
        S: BatchSource,
        R: ReportSink,
    {
        let opts = self.opts.clone();
        let total_epochs = opts.niter + opts.niter_decay;
        let dataset_size = source.len();

        for epoch in opts.epoch_count..=total_epochs {
            self.phase = Phase::EpochRunning;
            let epoch_start = Instant::now();
            let mut epoch_iter = 0;
            source.reset();

            while let Some(fetched) = source.next_batch() {
                let batch = fetched?;
                self.phase = Phase::IterationRunning;
                let iter_start = Instant::now();
                self.total_steps += opts.batch_size;
                epoch_iter += opts.batch_size;

                model.set_input(batch)?;
                model.optimize_parameters()?;

                if self.due(opts.display_freq) {
                    report.display_visuals(&model.current_visuals(), epoch)?;
                }

                if self.due(opts.print_freq) {
                    let errors = model.current_errors();
                    let sec_per_item =
                        iter_start.elapsed().as_secs_f64() / opts.batch_size as f64;
                    report.print_errors(&ErrorReport {
                        epoch,
                        total_epochs,
                        epoch_iter,
                        dataset_size,
                        errors: &errors,
                        sec_per_item,
                    })?;
                    if report.plot_enabled() {
                        let progress = epoch_iter as f64 / dataset_size.max(1) as f64;
                        report.plot_errors(epoch, progress, &errors)?;
                    }
                }

                if self.due(opts.save_latest_freq) {
                    self.phase = Phase::Checkpointing;
                    model.save(&CheckpointTag::Latest)?;
                }
            }

            if opts.save_epoch_freq > 0 && epoch % opts.save_epoch_freq == 0 {
                self.phase = Phase::Checkpointing;
                model.save(&CheckpointTag::Latest)?;
                model.save(&CheckpointTag::Epoch(epoch))?;
            }

            report.end_of_epoch(epoch, total_epochs, epoch_start.elapsed())?;

            if epoch > opts.niter {
                self.phase = Phase::Decaying;
                model.update_learning_rate();
            }
        }

        self.phase = Phase::Terminated;
        Ok(())
    }
}
