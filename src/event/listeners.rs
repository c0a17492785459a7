use super::event::{GitOutputEvent, OutputSource};
use log::{debug, warn};
use std::io::Write;

/// Error type returned by listeners; surfaced to the caller of `run`
/// as `GitError::Listener`.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// A consumer of subprocess output events.
///
/// Listeners run synchronously on the thread executing the command, in
/// subscription order. Returning an error aborts dispatch of the
/// remaining listeners and fails the command.
pub trait OutputListener: Send {
    fn handle_output(&mut self, event: &GitOutputEvent) -> Result<(), ListenerError>;
}

/// Streams chunks to the current process's stdout and stderr in real time.
#[derive(Debug, Default)]
pub struct StreamOutputListener;

impl OutputListener for StreamOutputListener {
    fn handle_output(&mut self, event: &GitOutputEvent) -> Result<(), ListenerError> {
        match event.source() {
            OutputSource::Stdout => {
                let mut out = std::io::stdout();
                out.write_all(event.chunk())?;
                out.flush()?;
            }
            OutputSource::Stderr => {
                let mut err = std::io::stderr();
                err.write_all(event.chunk())?;
                err.flush()?;
            }
        }
        Ok(())
    }
}

/// Forwards chunks through the `log` facade: stdout at debug, stderr at warn.
#[derive(Debug, Default)]
pub struct LoggerListener;

impl OutputListener for LoggerListener {
    fn handle_output(&mut self, event: &GitOutputEvent) -> Result<(), ListenerError> {
        let text = event.chunk_str();
        let text = text.trim_end();
        if text.is_empty() {
            return Ok(());
        }
        match event.source() {
            OutputSource::Stdout => {
                debug!(target: "gitwrap.output", "[{}] {text}", event.command_line());
            }
            OutputSource::Stderr => {
                warn!(target: "gitwrap.output", "[{}] {text}", event.command_line());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_listener_accepts_events() {
        let mut listener = LoggerListener;
        let event = GitOutputEvent::new("status", OutputSource::Stdout, b"ok\n");
        assert!(listener.handle_output(&event).is_ok());
    }

    #[test]
    fn test_logger_listener_skips_blank_chunks() {
        let mut listener = LoggerListener;
        let event = GitOutputEvent::new("status", OutputSource::Stderr, b"\n");
        assert!(listener.handle_output(&event).is_ok());
    }
}
