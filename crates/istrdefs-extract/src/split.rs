//! Stream Splitter
//!
//! Single pass over concatenated preprocessor output. Line markers decide
//! which originating file the following lines belong to; records are
//! buffered per file and handed to an [`ArtifactSink`] on every transition.

use crate::artifact::{ArtifactSink, ArtifactWriter};
use crate::extract::{Extractor, MarkerParser};
use istrdefs_core::{ExtractionRecord, Mode, Result, SplitSummary};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Splitter state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitState {
    NoActiveFile,
    ActiveFile(String),
}

/// Streaming state machine feeding an artifact sink
pub struct Splitter<S: ArtifactSink> {
    markers: MarkerParser,
    extractor: Extractor,
    sink: S,
    state: SplitState,
    buffer: Vec<ExtractionRecord>,
}

impl<S: ArtifactSink> Splitter<S> {
    pub fn new(mode: Mode, sink: S) -> Self {
        Self {
            markers: MarkerParser::new(),
            extractor: Extractor::new(mode),
            sink,
            state: SplitState::NoActiveFile,
            buffer: Vec::new(),
        }
    }

    pub fn state(&self) -> &SplitState {
        &self.state
    }

    /// Process one physical line (with or without its terminator)
    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        if let Some(marker) = self.markers.parse(line) {
            // Headers, <built-in> and friends leave the state untouched.
            if !marker.is_source() {
                return Ok(());
            }
            if self.state != SplitState::ActiveFile(marker.file.clone()) {
                self.flush()?;
                self.state = SplitState::ActiveFile(marker.file);
            }
            return Ok(());
        }

        if let SplitState::ActiveFile(_) = self.state {
            self.extractor.extract_line(line, &mut self.buffer);
        }
        Ok(())
    }

    /// Flush the last file and hand back the sink
    pub fn finish(mut self) -> Result<S> {
        self.flush()?;
        Ok(self.sink)
    }

    fn flush(&mut self) -> Result<()> {
        if let SplitState::ActiveFile(ref file) = self.state {
            self.sink.flush(file, &self.buffer)?;
        }
        self.buffer.clear();
        Ok(())
    }
}

/// Drive a splitter over any buffered reader.
///
/// Lines are decoded lossily so stray non-UTF-8 bytes in the preprocessor
/// output never abort a run.
pub fn split_reader<R: BufRead, S: ArtifactSink>(mut reader: R, mode: Mode, sink: S) -> Result<S> {
    let mut splitter = Splitter::new(mode, sink);
    let mut raw = Vec::new();

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        splitter.feed_line(&String::from_utf8_lossy(&raw))?;
    }

    splitter.finish()
}

/// Split a preprocessed stream on disk into per-file artifacts in `output_dir`
pub fn split(mode: Mode, input: &Path, output_dir: &Path) -> Result<SplitSummary> {
    debug!("Splitting {:?} into {:?} ({} mode)", input, output_dir, mode);

    let reader = BufReader::new(File::open(input)?);
    let writer = ArtifactWriter::new(output_dir, mode)?;
    let summary = split_reader(reader, mode, writer)?.into_summary();

    info!(
        "Split {:?}: {} artifacts, {} records, {} stale removed",
        input, summary.artifacts, summary.records, summary.removed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that keeps every flush in memory, in order
    #[derive(Default)]
    struct MemorySink {
        flushes: Vec<(String, Vec<String>)>,
    }

    impl ArtifactSink for MemorySink {
        fn flush(&mut self, file: &str, records: &[ExtractionRecord]) -> Result<()> {
            self.flushes.push((
                file.to_string(),
                records.iter().map(|r| r.0.clone()).collect(),
            ));
            Ok(())
        }
    }

    fn run(mode: Mode, input: &str) -> Vec<(String, Vec<String>)> {
        split_reader(input.as_bytes(), mode, MemorySink::default())
            .unwrap()
            .flushes
    }

    #[test]
    fn test_initial_state() {
        let splitter = Splitter::new(Mode::Istr, MemorySink::default());
        assert_eq!(splitter.state(), &SplitState::NoActiveFile);
    }

    #[test]
    fn test_records_never_cross_files() {
        let flushes = run(Mode::Istr, "# 1 \"a.c\"\nISTR_FOO\n# 1 \"b.c\"\nISTR_BAR\n");
        assert_eq!(
            flushes,
            vec![
                ("a.c".to_string(), vec!["Q(FOO)".to_string()]),
                ("b.c".to_string(), vec!["Q(BAR)".to_string()]),
            ]
        );
    }

    #[test]
    fn test_lines_before_first_marker_ignored() {
        let flushes = run(Mode::Istr, "ISTR_EARLY\n\n# 1 \"a.c\"\nISTR_LATE\n");
        assert_eq!(flushes, vec![("a.c".to_string(), vec!["Q(LATE)".to_string()])]);
    }

    #[test]
    fn test_header_marker_does_not_reset() {
        let input = "# 1 \"a.c\"\nISTR_ONE\n# 1 \"inc/istr.h\" 1\nISTR_TWO\n# 5 \"a.c\" 2\nISTR_THREE\n";
        let flushes = run(Mode::Istr, input);
        assert_eq!(
            flushes,
            vec![(
                "a.c".to_string(),
                vec!["Q(ONE)".to_string(), "Q(TWO)".to_string(), "Q(THREE)".to_string()]
            )]
        );
    }

    #[test]
    fn test_no_markers_no_artifacts() {
        assert!(run(Mode::Istr, "ISTR_FOO\nISTR_BAR\n").is_empty());
        assert!(run(Mode::Istr, "").is_empty());
    }

    #[test]
    fn test_same_file_marker_is_noop() {
        let flushes = run(Mode::Istr, "# 1 \"a.c\"\nISTR_A\n# 9 \"a.c\"\nISTR_B\n");
        assert_eq!(flushes.len(), 1);
        assert_eq!(flushes[0].1, vec!["Q(A)", "Q(B)"]);
    }

    #[test]
    fn test_file_without_records_still_flushed() {
        let flushes = run(Mode::Istr, "# 1 \"a.c\"\nint x;\n# 1 \"b.cpp\"\nISTR_B\n");
        assert_eq!(flushes[0], ("a.c".to_string(), Vec::new()));
        assert_eq!(flushes[1], ("b.cpp".to_string(), vec!["Q(B)".to_string()]));
    }

    #[test]
    fn test_non_utf8_bytes_tolerated() {
        let mut input = b"# 1 \"a.c\"\nchar c = '\xff'; ISTR_OK\n".to_vec();
        input.extend_from_slice(b"ISTR_NEXT");
        let sink = split_reader(input.as_slice(), Mode::Istr, MemorySink::default()).unwrap();
        assert_eq!(sink.flushes[0].1, vec!["Q(OK)", "Q(NEXT)"]);
    }
}
