use std::fmt;

/// Status notifications emitted while a batch runs, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Starting,
    Extracting(String),
    Unprotecting(String),
    Compressing(String),
    Saving(String),
    Done,
}

impl BatchStatus {
    /// Name of the file the status refers to, if any.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            BatchStatus::Extracting(name)
            | BatchStatus::Unprotecting(name)
            | BatchStatus::Compressing(name)
            | BatchStatus::Saving(name) => Some(name),
            BatchStatus::Starting | BatchStatus::Done => None,
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Starting => write!(f, "Starting..."),
            BatchStatus::Extracting(name) => write!(f, "Extracting {}...", name),
            BatchStatus::Unprotecting(name) => write!(f, "Unprotecting {}...", name),
            BatchStatus::Compressing(name) => write!(f, "Compressing {}...", name),
            BatchStatus::Saving(name) => write!(f, "Saving {}...", name),
            BatchStatus::Done => write!(f, "Done."),
        }
    }
}
