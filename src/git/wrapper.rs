use super::command::GitCommand;
use super::error::{GitError, Result};
use super::process::GitProcess;
use super::working_copy::GitWorkingCopy;
use crate::config::Config;
use crate::event::{
    EventDispatcher, GIT_OUTPUT, GitOutputEvent, ListenerId, OutputListener, StreamOutputListener,
};
use log::debug;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variables set as a group for private-key authentication.
/// `GIT_SSH` points at the connecting wrapper script, which reads the
/// other two.
const PRIVATE_KEY_VARS: [&str; 3] = ["GIT_SSH", "GIT_SSH_KEY", "GIT_SSH_PORT"];

/// A wrapper around the Git binary.
///
/// Holds the context commands run in — binary path, environment overlay,
/// timeout — and one event dispatcher that receives every chunk of
/// subprocess output while a command executes.
pub struct GitWrapper {
    binary: PathBuf,
    env: HashMap<String, String>,
    timeout: Duration,
    dispatcher: EventDispatcher,
    stream_listener: Option<ListenerId>,
}

impl GitWrapper {
    /// Create a wrapper, resolving the git binary on `PATH`.
    pub fn new() -> Result<Self> {
        let binary = find_executable("git").ok_or_else(|| {
            GitError::Configuration("unable to find the git executable on PATH".to_string())
        })?;
        Ok(Self::with_binary(binary))
    }

    /// Create a wrapper around an explicit binary path.
    pub fn with_binary<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: binary.into(),
            env: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            dispatcher: EventDispatcher::new(),
            stream_listener: None,
        }
    }

    /// Build a wrapper from a loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut wrapper = match &config.binary {
            Some(binary) => Self::with_binary(binary.clone()),
            None => Self::new()?,
        };
        wrapper.set_timeout(Duration::from_secs(config.timeout_secs));
        for (var, value) in &config.env {
            wrapper.set_env_var(var, value);
        }
        wrapper.stream_output(config.stream_output);
        Ok(wrapper)
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn set_binary<P: Into<PathBuf>>(&mut self, binary: P) {
        self.binary = binary.into();
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Set an environment variable defined only in the scope of commands
    /// run through this wrapper.
    pub fn set_env_var(&mut self, var: impl Into<String>, value: impl Into<String>) {
        self.env.insert(var.into(), value.into());
    }

    pub fn unset_env_var(&mut self, var: &str) {
        self.env.remove(var);
    }

    pub fn env_var(&self, var: &str) -> Option<&str> {
        self.env.get(var).map(String::as_str)
    }

    pub fn env_vars(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Use an alternate private key when connecting to remotes.
    ///
    /// Points `GIT_SSH` at the connecting wrapper script and sets the
    /// `GIT_SSH_KEY` / `GIT_SSH_PORT` variables the script reads. Both
    /// paths must exist; nothing is set if either fails to resolve.
    pub fn set_private_key(
        &mut self,
        private_key: &Path,
        port: u16,
        wrapper_script: &Path,
    ) -> Result<()> {
        let wrapper_path = wrapper_script.canonicalize().map_err(|e| {
            GitError::Configuration(format!(
                "path to GIT_SSH wrapper script could not be resolved: {}: {e}",
                wrapper_script.display()
            ))
        })?;
        let key_path = private_key.canonicalize().map_err(|e| {
            GitError::Configuration(format!(
                "path to private key could not be resolved: {}: {e}",
                private_key.display()
            ))
        })?;

        self.set_env_var("GIT_SSH", wrapper_path.to_string_lossy());
        self.set_env_var("GIT_SSH_KEY", key_path.to_string_lossy());
        self.set_env_var("GIT_SSH_PORT", port.to_string());
        Ok(())
    }

    /// Remove the private-key variable group set by `set_private_key`.
    pub fn unset_private_key(&mut self) {
        for var in PRIVATE_KEY_VARS {
            self.env.remove(var);
        }
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut EventDispatcher {
        &mut self.dispatcher
    }

    /// Register a listener for subprocess output events.
    pub fn add_output_listener(&mut self, listener: Box<dyn OutputListener>) -> ListenerId {
        self.dispatcher.subscribe(GIT_OUTPUT, listener)
    }

    pub fn remove_output_listener(&mut self, id: ListenerId) -> Option<Box<dyn OutputListener>> {
        self.dispatcher.unsubscribe(GIT_OUTPUT, id)
    }

    /// Toggle real-time streaming of subprocess output to this process's
    /// stdout and stderr.
    pub fn stream_output(&mut self, stream: bool) {
        match (stream, self.stream_listener) {
            (true, None) => {
                self.stream_listener =
                    Some(self.add_output_listener(Box::new(StreamOutputListener)));
            }
            (false, Some(id)) => {
                self.dispatcher.unsubscribe(GIT_OUTPUT, id);
                self.stream_listener = None;
            }
            _ => {}
        }
    }

    /// A handle for directory-scoped operations on a working copy.
    pub fn working_copy<P: Into<PathBuf>>(&mut self, directory: P) -> GitWorkingCopy<'_> {
        GitWorkingCopy::new(self, directory.into())
    }

    /// The version of the installed git client.
    pub fn version(&mut self) -> Result<String> {
        self.git("--version", None)
    }

    /// Run `git init` in `directory` and return the working copy, marked
    /// as cloned.
    pub fn init<P: Into<PathBuf>>(
        &mut self,
        directory: P,
        options: &[&str],
    ) -> Result<GitWorkingCopy<'_>> {
        let mut git = GitWorkingCopy::new(self, directory.into());
        git.init(options)?;
        git.set_cloned(true);
        Ok(git)
    }

    /// Clone `repository` and return the working copy, marked as cloned.
    ///
    /// When `directory` is not given it is derived from the repository URL
    /// via [`parse_repository_name`].
    pub fn clone_repository(
        &mut self,
        repository: &str,
        directory: Option<PathBuf>,
        options: &[&str],
    ) -> Result<GitWorkingCopy<'_>> {
        let directory =
            directory.unwrap_or_else(|| PathBuf::from(parse_repository_name(repository)));
        let mut git = GitWorkingCopy::new(self, directory);
        git.clone_from(repository, options)?;
        git.set_cloned(true);
        Ok(git)
    }

    /// Run an arbitrary git command from a raw command line, e.g.
    /// `"config -l"`, and return its stdout.
    pub fn git(&mut self, command_line: &str, cwd: Option<&Path>) -> Result<String> {
        let mut command = GitCommand::new(command_line);
        if let Some(cwd) = cwd {
            command.set_directory(cwd);
        }
        self.run(&command, None)
    }

    /// Run a command, publishing every output chunk to the dispatcher as
    /// it arrives, and return accumulated stdout.
    ///
    /// An explicit `cwd` takes precedence over the command's own
    /// directory. Bypassed commands return empty output without spawning
    /// a subprocess.
    pub fn run(&mut self, command: &GitCommand, cwd: Option<&Path>) -> Result<String> {
        if command.is_bypassed() {
            debug!(target: "gitwrap", "bypassed command: {}", command.command_line());
            return Ok(String::new());
        }

        let directory = cwd
            .map(Path::to_path_buf)
            .or_else(|| command.directory().map(Path::to_path_buf));

        let process = GitProcess::new(
            self.binary.clone(),
            command.args().to_vec(),
            directory,
            self.env.clone(),
            self.timeout,
        );

        let command_line = command.command_line();
        let dispatcher = &mut self.dispatcher;
        let output = process.run(|source, chunk| {
            let event = GitOutputEvent::new(command_line.clone(), source, chunk);
            dispatcher.publish(GIT_OUTPUT, &event)
        })?;

        Ok(output.stdout)
    }
}

impl std::fmt::Debug for GitWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitWrapper")
            .field("binary", &self.binary)
            .field("timeout", &self.timeout)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Parse the repository name out of a repository URL or path.
///
/// `"git@github.com:org/repo.git"` and `"https://host/org/repo.git"` both
/// yield `"repo"`.
pub fn parse_repository_name(repository: &str) -> String {
    let path = match Url::parse(repository) {
        Ok(parsed) if !parsed.cannot_be_a_base() => parsed.path().to_string(),
        // No scheme: scp-like syntax keeps everything after the colon
        _ => match repository.split_once(':') {
            Some((_, rest)) => rest.to_string(),
            None => repository.to_string(),
        },
    };

    let trimmed = path.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    name.strip_suffix(".git").unwrap_or(name).to_string()
}

/// Locate an executable by name on `PATH`, like shell `which`. A name
/// containing path separators is treated as a direct path.
fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_repository_name_scp_syntax() {
        assert_eq!(parse_repository_name("git@github.com:org/repo.git"), "repo");
    }

    #[test]
    fn test_parse_repository_name_https() {
        assert_eq!(
            parse_repository_name("https://example.com/org/thing.git"),
            "thing"
        );
    }

    #[test]
    fn test_parse_repository_name_ssh_with_port() {
        assert_eq!(
            parse_repository_name("ssh://git@host:29418/nested/path/repo.git"),
            "repo"
        );
    }

    #[test]
    fn test_parse_repository_name_plain_path() {
        assert_eq!(parse_repository_name("/srv/git/project"), "project");
        assert_eq!(parse_repository_name("/srv/git/project.git/"), "project");
    }

    #[test]
    fn test_bypassed_command_never_spawns() {
        // A spawn would fail loudly with this binary
        let mut wrapper = GitWrapper::with_binary("/nonexistent/git");
        let command = GitCommand::new("clone url").bypassed();
        assert_eq!(wrapper.run(&command, None).unwrap(), "");
    }

    #[test]
    fn test_missing_binary_fails_before_output() {
        let mut wrapper = GitWrapper::with_binary("/nonexistent/git");
        let err = wrapper.run(&GitCommand::new("--version"), None).unwrap_err();
        assert!(matches!(err, GitError::Configuration(_)));
    }

    #[test]
    fn test_env_var_set_get_unset() {
        let mut wrapper = GitWrapper::with_binary("git");
        wrapper.set_env_var("HOME", "/tmp/home");
        assert_eq!(wrapper.env_var("HOME"), Some("/tmp/home"));

        wrapper.unset_env_var("HOME");
        assert_eq!(wrapper.env_var("HOME"), None);
    }

    #[test]
    fn test_private_key_group_set_and_unset() {
        let temp_dir = TempDir::new().unwrap();
        let key = temp_dir.path().join("id_ed25519");
        let script = temp_dir.path().join("git-ssh-wrapper.sh");
        std::fs::write(&key, "key material").unwrap();
        std::fs::write(&script, "#!/bin/sh\n").unwrap();

        let mut wrapper = GitWrapper::with_binary("git");
        wrapper.set_env_var("HOME", "/tmp/home");
        wrapper.set_private_key(&key, 2222, &script).unwrap();

        assert_eq!(wrapper.env_vars().len(), 4);
        assert!(wrapper.env_var("GIT_SSH").unwrap().ends_with("git-ssh-wrapper.sh"));
        assert!(wrapper.env_var("GIT_SSH_KEY").unwrap().ends_with("id_ed25519"));
        assert_eq!(wrapper.env_var("GIT_SSH_PORT"), Some("2222"));

        // Exactly the three group variables are removed
        wrapper.unset_private_key();
        assert_eq!(wrapper.env_vars().len(), 1);
        assert_eq!(wrapper.env_var("HOME"), Some("/tmp/home"));
    }

    #[test]
    fn test_private_key_with_missing_script_fails() {
        let temp_dir = TempDir::new().unwrap();
        let key = temp_dir.path().join("id_ed25519");
        std::fs::write(&key, "key material").unwrap();

        let mut wrapper = GitWrapper::with_binary("git");
        let missing = temp_dir.path().join("missing.sh");
        let err = wrapper.set_private_key(&key, 22, &missing).unwrap_err();
        assert!(matches!(err, GitError::Configuration(_)));
        // Nothing was set
        assert!(wrapper.env_vars().is_empty());
    }

    #[test]
    fn test_private_key_with_missing_key_fails() {
        let temp_dir = TempDir::new().unwrap();
        let script = temp_dir.path().join("git-ssh-wrapper.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();

        let mut wrapper = GitWrapper::with_binary("git");
        let missing = temp_dir.path().join("missing_key");
        let err = wrapper.set_private_key(&missing, 22, &script).unwrap_err();
        assert!(matches!(err, GitError::Configuration(_)));
        assert!(wrapper.env_vars().is_empty());
    }

    #[test]
    fn test_stream_output_toggles_one_listener() {
        let mut wrapper = GitWrapper::with_binary("git");
        assert_eq!(wrapper.dispatcher().listener_count(GIT_OUTPUT), 0);

        wrapper.stream_output(true);
        wrapper.stream_output(true); // Idempotent
        assert_eq!(wrapper.dispatcher().listener_count(GIT_OUTPUT), 1);

        wrapper.stream_output(false);
        wrapper.stream_output(false);
        assert_eq!(wrapper.dispatcher().listener_count(GIT_OUTPUT), 0);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.binary = Some(PathBuf::from("/usr/bin/git"));
        config.timeout_secs = 5;
        config
            .env
            .insert("GIT_TERMINAL_PROMPT".to_string(), "0".to_string());
        config.stream_output = true;

        let wrapper = GitWrapper::from_config(&config).unwrap();
        assert_eq!(wrapper.binary(), Path::new("/usr/bin/git"));
        assert_eq!(wrapper.timeout(), Duration::from_secs(5));
        assert_eq!(wrapper.env_var("GIT_TERMINAL_PROMPT"), Some("0"));
        assert_eq!(wrapper.dispatcher().listener_count(GIT_OUTPUT), 1);
    }

    #[test]
    fn test_find_executable_resolves_sh() {
        assert!(find_executable("sh").is_some());
        assert!(find_executable("no-such-binary-gitwrap").is_none());
    }
}
