pub mod checkpoint;
pub mod error;
pub mod infer;
pub mod metrics;
pub mod model;
pub mod report;
pub mod schedule;
pub mod trainer;

pub use checkpoint::{CheckpointStore, CheckpointTag, NetworkState};
pub use error::{CheckpointError, TrainError};
pub use infer::InferenceSession;
pub use model::{Batch, BatchSource, Model};
pub use report::{ConsoleReport, CsvErrorLog, ErrorReport, ReportSink};
pub use schedule::LinearDecayLR;
pub use trainer::{Phase, TrainOptions, TrainingOrchestrator};
