use super::command::GitCommand;
use super::error::Result;
use super::wrapper::GitWrapper;
use std::path::{Path, PathBuf};

/// A directory bound to the wrapper for repeated scoped operations.
///
/// The `cloned` flag is purely informational: it starts unset and flips
/// after a successful init or clone.
#[derive(Debug)]
pub struct GitWorkingCopy<'w> {
    wrapper: &'w mut GitWrapper,
    directory: PathBuf,
    cloned: bool,
}

impl<'w> GitWorkingCopy<'w> {
    pub fn new(wrapper: &'w mut GitWrapper, directory: PathBuf) -> Self {
        Self {
            wrapper,
            directory,
            cloned: false,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_cloned(&self) -> bool {
        self.cloned
    }

    pub fn set_cloned(&mut self, cloned: bool) {
        self.cloned = cloned;
    }

    /// Run `git init` with this working copy's directory as the target.
    pub fn init(&mut self, options: &[&str]) -> Result<String> {
        let mut args: Vec<String> = vec!["init".to_string()];
        args.extend(options.iter().map(ToString::to_string));
        args.push(self.directory.to_string_lossy().into_owned());

        let command = GitCommand::from_args(args);
        let output = self.wrapper.run(&command, None)?;
        self.cloned = true;
        Ok(output)
    }

    /// Run `git clone <repository>` into this working copy's directory.
    pub fn clone_from(&mut self, repository: &str, options: &[&str]) -> Result<String> {
        let mut args: Vec<String> = vec!["clone".to_string()];
        args.extend(options.iter().map(ToString::to_string));
        args.push(repository.to_string());
        args.push(self.directory.to_string_lossy().into_owned());

        let command = GitCommand::from_args(args);
        let output = self.wrapper.run(&command, None)?;
        self.cloned = true;
        Ok(output)
    }

    /// Record that the directory already holds a clone without touching it.
    ///
    /// The command exists only for the local state change; its bypass flag
    /// guarantees no subprocess is spawned.
    pub fn mark_cloned(&mut self) -> Result<()> {
        let command = GitCommand::from_args([
            "clone".to_string(),
            self.directory.to_string_lossy().into_owned(),
        ])
        .bypassed();
        self.wrapper.run(&command, None)?;
        self.cloned = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_uninitialized() {
        let mut wrapper = GitWrapper::with_binary("git");
        let copy = wrapper.working_copy("/tmp/somewhere");
        assert!(!copy.is_cloned());
        assert_eq!(copy.directory(), Path::new("/tmp/somewhere"));
    }

    #[test]
    fn test_mark_cloned_spawns_nothing() {
        // A spawn would fail loudly with this binary
        let mut wrapper = GitWrapper::with_binary("/nonexistent/git");
        let mut copy = wrapper.working_copy("/tmp/somewhere");

        copy.mark_cloned().unwrap();
        assert!(copy.is_cloned());
    }

    #[test]
    fn test_set_cloned_is_reversible() {
        let mut wrapper = GitWrapper::with_binary("git");
        let mut copy = wrapper.working_copy("/tmp/somewhere");

        copy.set_cloned(true);
        assert!(copy.is_cloned());
        copy.set_cloned(false);
        assert!(!copy.is_cloned());
    }
}
