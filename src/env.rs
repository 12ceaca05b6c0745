use indexmap::IndexMap;
use std::env as stdenv;
use std::ffi::CString;
use std::path::PathBuf;

/// Mutable, user-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: the variables visible to built-ins and handed to every external
///   command, kept in the order they were first defined.
/// - `current_dir`: the working directory as last observed by the interpreter.
///
/// The interpreter owns one `Environment` and passes it explicitly to built-ins
/// and to the process launcher, so tests can build one without touching the
/// real process environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: IndexMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// Variables are copied from `std::env::vars_os()` in the order the process
    /// environment lists them; entries that are not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = stdenv::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override an environment variable.
    ///
    /// An existing key keeps its position; a new key is appended.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Iterate over `(key, value)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render the store as `KEY=VALUE` C strings for `execve`.
    ///
    /// Entries containing an interior NUL byte cannot be passed to a child and are
    /// dropped.
    pub fn to_envp(&self) -> Vec<CString> {
        self.iter()
            .filter_map(|(k, v)| CString::new(format!("{k}={v}")).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use std::env as stdenv;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment {
            vars: Default::default(),
            current_dir: stdenv::current_dir().unwrap(),
        };

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE"));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::from_process();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_env_keeps_definition_order() {
        let mut env = Environment::default();
        env.set_var("B", "1");
        env.set_var("A", "2");
        env.set_var("B", "3");

        let pairs: Vec<_> = env.iter().collect();
        assert_eq!(pairs, vec![("B", "3"), ("A", "2")]);
    }

    #[test]
    fn test_envp_skips_interior_nul() {
        let mut env = Environment::default();
        env.set_var("GOOD", "yes");
        env.set_var("BAD", "a\0b");

        let envp = env.to_envp();
        assert_eq!(envp.len(), 1);
        assert_eq!(envp[0].to_str().unwrap(), "GOOD=yes");
    }
}
