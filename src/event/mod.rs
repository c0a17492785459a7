// Output events and the publish/subscribe dispatcher

pub mod dispatcher;
pub mod event;
pub mod listeners;

pub use dispatcher::{EventDispatcher, GIT_OUTPUT, ListenerId};
pub use event::{GitOutputEvent, OutputSource};
pub use listeners::{ListenerError, LoggerListener, OutputListener, StreamOutputListener};
