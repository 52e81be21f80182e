/// Placed between consecutive oracle logs in the finalized trace.
///
/// The middle line is the log section header, which a decoded log never contains, so splitting
/// the trace on this string gives back the recorded entries even when a log spans several lines.
pub const TRACE_SEPARATOR: &str = "\n--- BCP EXECUTION LOG ---\n";

/// Oracle logs in call order, including branches that were later backtracked away.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    entries: Vec<String>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, log: impl Into<String>) {
        self.entries.push(log.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Joins every entry into the execution record. Consumes the recorder.
    pub fn finalize(self) -> String {
        self.entries.join(TRACE_SEPARATOR)
    }
}
