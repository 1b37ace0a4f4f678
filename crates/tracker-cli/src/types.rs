use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Done,
    Failed {
        /// Line of the failing row, when a row failed.
        line: Option<u64>,
        reason: String,
    },
}

impl FileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: PathBuf,
    /// Rows that completed the pipeline.
    pub rows_processed: usize,
    pub outcome: FileOutcome,
    /// Where the file was moved; `None` when the move failed.
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub reports: Vec<FileReport>,
}

impl ImportResult {
    pub fn failed_files(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.outcome.is_failed())
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_files() > 0
    }

    pub fn rows_processed(&self) -> usize {
        self.reports.iter().map(|report| report.rows_processed).sum()
    }
}
