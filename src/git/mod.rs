// Git command construction and subprocess execution

pub mod command;
pub mod error;
pub mod process;
pub mod working_copy;
pub mod wrapper;

pub use command::GitCommand;
pub use error::{GitError, Result};
pub use process::{GitProcess, ProcessOutput};
pub use working_copy::GitWorkingCopy;
pub use wrapper::{GitWrapper, parse_repository_name};
