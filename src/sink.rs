//! Destinations for the script `log` statement.

/// Receives each `log` entry with the line it came from.
pub trait LogSink {
    fn log(&mut self, line: usize, message: &str);
}

/// Discards everything. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&mut self, _line: usize, _message: &str) {}
}

/// Forwards entries to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&mut self, line: usize, message: &str) {
        tracing::info!(target: "rulekit::script", line, "Log entry: {message}");
    }
}

impl<F> LogSink for F
where
    F: FnMut(usize, &str),
{
    fn log(&mut self, line: usize, message: &str) {
        self(line, message)
    }
}
