//! Flag file output
//!
//! Writes one flag per line, in discovery order, replacing any previous file.

use crate::output::traits::{CrawlSummary, OutputResult, ResultSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink writing the discovered flags to a plain text file
#[derive(Debug, Clone)]
pub struct FlagFileSink {
    path: PathBuf,
}

impl FlagFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for FlagFileSink {
    fn write(&self, summary: &CrawlSummary) -> OutputResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        for flag in &summary.payloads {
            writeln!(writer, "{}", flag)?;
        }
        writer.flush()?;

        tracing::info!(
            "Wrote {} flags to {}",
            summary.payloads.len(),
            self.path.display()
        );
        Ok(())
    }
}
