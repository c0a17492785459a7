use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// Which stream of the subprocess a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
    Stdout,
    Stderr,
}

/// One chunk of subprocess output, delivered to subscribers as it arrives.
///
/// Events are created once per chunk and never mutated; ordering is the
/// order of emission by the subprocess.
#[derive(Debug, Clone)]
pub struct GitOutputEvent {
    command_line: String,
    source: OutputSource,
    chunk: Vec<u8>,
    received_at: DateTime<Utc>,
}

impl GitOutputEvent {
    pub fn new(command_line: impl Into<String>, source: OutputSource, chunk: &[u8]) -> Self {
        Self {
            command_line: command_line.into(),
            source,
            chunk: chunk.to_vec(),
            received_at: Utc::now(),
        }
    }

    /// The command line that produced this chunk.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn source(&self) -> OutputSource {
        self.source
    }

    /// The raw bytes of the chunk.
    pub fn chunk(&self) -> &[u8] {
        &self.chunk
    }

    /// The chunk as text, with invalid UTF-8 replaced.
    pub fn chunk_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.chunk)
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = GitOutputEvent::new("status", OutputSource::Stdout, b"clean\n");
        assert_eq!(event.command_line(), "status");
        assert_eq!(event.source(), OutputSource::Stdout);
        assert_eq!(event.chunk(), b"clean\n");
        assert_eq!(event.chunk_str(), "clean\n");
    }

    #[test]
    fn test_chunk_str_is_lossy() {
        let event = GitOutputEvent::new("log", OutputSource::Stderr, &[0xff, b'x']);
        assert_eq!(event.chunk_str(), "\u{fffd}x");
    }
}
