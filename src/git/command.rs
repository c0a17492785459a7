use std::path::{Path, PathBuf};

/// One Git invocation: everything after the binary on the command line.
///
/// A command is built once, run once, and discarded. The working directory
/// is the only field that may change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GitCommand {
    args: Vec<String>,
    directory: Option<PathBuf>,
    bypass: bool,
}

impl GitCommand {
    /// Create a command from a raw command line, e.g. `"config -l"`.
    ///
    /// The line is tokenized on whitespace. Use [`GitCommand::from_args`]
    /// when an argument contains spaces.
    pub fn new(command_line: &str) -> Self {
        Self::from_args(command_line.split_whitespace())
    }

    /// Create a command from an explicit argument list.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            directory: None,
            bypass: false,
        }
    }

    /// Set the working directory the command runs in.
    pub fn with_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Mark the command as bypassed: it is built but never executed.
    ///
    /// Used for commands whose only purpose is a local state change, such
    /// as marking a working copy as already cloned.
    pub fn bypassed(mut self) -> Self {
        self.bypass = true;
        self
    }

    /// Change the working directory after construction.
    pub fn set_directory<P: Into<PathBuf>>(&mut self, directory: P) {
        self.directory = Some(directory.into());
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// The command line as a single string, for display and events.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tokenizes_on_whitespace() {
        let command = GitCommand::new("config  -l");
        assert_eq!(command.args(), ["config", "-l"]);
    }

    #[test]
    fn test_from_args_preserves_spaces() {
        let command = GitCommand::from_args(["commit", "-m", "two words"]);
        assert_eq!(command.args(), ["commit", "-m", "two words"]);
    }

    #[test]
    fn test_defaults() {
        let command = GitCommand::new("status");
        assert!(command.directory().is_none());
        assert!(!command.is_bypassed());
    }

    #[test]
    fn test_with_directory_and_set_directory() {
        let command = GitCommand::new("status").with_directory("/tmp/a");
        assert_eq!(command.directory(), Some(Path::new("/tmp/a")));

        let mut command = GitCommand::new("status");
        command.set_directory("/tmp/b");
        assert_eq!(command.directory(), Some(Path::new("/tmp/b")));
    }

    #[test]
    fn test_bypassed() {
        let command = GitCommand::new("clone").bypassed();
        assert!(command.is_bypassed());
    }

    #[test]
    fn test_command_line() {
        let command = GitCommand::from_args(["clone", "url", "dir"]);
        assert_eq!(command.command_line(), "clone url dir");
    }
}
