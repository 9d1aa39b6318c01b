//! Interpretation of the capture tool's unstructured diagnostic stream

pub mod classifier;
pub mod progress;

pub use classifier::{
    Diagnosis, ErrorCategory, ErrorClassifier, ErrorRule, ErrorTable, BUILTIN_TABLE_VERSION,
};
pub use progress::{FrameValidator, ProgressLine, VALIDATION_THRESHOLD};
