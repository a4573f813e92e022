//! Terminal sink: retry decisions on stderr, optionally mirrored into the log.

use again_core::retry::RetrySink;
use std::io::{self, Write};

/// Warnings always reach the writer; verbose lines only with `--verbose`.
///
/// `mirror` forwards every line to `tracing` as well. It must be off when the
/// tracing subscriber itself writes to stderr, or each line shows up twice.
#[derive(Debug)]
pub struct ConsoleSink<W = io::Stderr> {
    verbose: bool,
    mirror: bool,
    writer: W,
}

impl ConsoleSink {
    pub fn new(verbose: bool, mirror: bool) -> Self {
        Self::with_writer(verbose, mirror, io::stderr())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn with_writer(verbose: bool, mirror: bool, writer: W) -> Self {
        Self {
            verbose,
            mirror,
            writer,
        }
    }

    #[cfg(test)]
    fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> RetrySink for ConsoleSink<W> {
    fn warn(&mut self, message: &str) {
        if self.mirror {
            tracing::warn!("{}", message);
        }
        let _ = writeln!(self.writer, "WARNING: {}", message);
    }

    fn verbose(&mut self, message: &str) {
        if self.mirror {
            tracing::debug!("{}", message);
        }
        if self.verbose {
            let _ = writeln!(self.writer, "VERBOSE: {}", message);
        }
    }
}
