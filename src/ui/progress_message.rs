/// Stage of a scan shown by its own progress bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Parsing and walking source files
    Walking,
    /// Serializing the model
    Writing,
}

/// Sent by the scanner to the render thread of [`super::ProgressManager`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressMessage {
    /// A phase begins with `total` steps
    Started { phase: ProgressPhase, total: usize },
    /// One step is done; `file` is the relative path when walking
    Progress {
        phase: ProgressPhase,
        file: Option<String>,
    },
    Finished { phase: ProgressPhase },
    /// A source file could not be read or parsed
    Skipped(String),
}
