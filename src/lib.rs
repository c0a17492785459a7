// gitwrap: a thin wrapper around the Git binary.
//
// The facade (`GitWrapper`) holds the execution context — binary path,
// environment overlay, timeout — and streams subprocess output to
// registered listeners while a command runs.

pub mod config;
pub mod event;
pub mod git;

pub use config::Config;
pub use event::{
    EventDispatcher, GIT_OUTPUT, GitOutputEvent, ListenerError, ListenerId, LoggerListener,
    OutputListener, OutputSource, StreamOutputListener,
};
pub use git::{
    GitCommand, GitError, GitWorkingCopy, GitWrapper, Result, parse_repository_name,
};
