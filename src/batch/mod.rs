pub mod report;
pub mod status;

pub use report::{BatchReport, FileOutcome, UnprotectRequest};
pub use status::BatchStatus;

pub(crate) use report::BatchProgress;
