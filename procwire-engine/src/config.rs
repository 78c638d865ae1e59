//! Executor configuration.

use std::time::Duration;

/// Runtime knobs for [`ProcedureExecutor`](crate::ProcedureExecutor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Upper bound on the database work of one call. `None` waits forever.
    pub command_timeout: Option<Duration>,
    /// CLOSE each cursor after fetching it when running inside a caller's
    /// transaction. Cursors of locally owned transactions close on commit.
    pub close_borrowed_cursors: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            command_timeout: None,
            close_borrowed_cursors: true,
        }
    }
}

impl ExecutorConfig {
    /// Create config from environment variables.
    ///
    /// `PROCWIRE_COMMAND_TIMEOUT_SECS` (unset or `0` disables the timeout),
    /// `PROCWIRE_CLOSE_BORROWED_CURSORS` (`true`/`false`, default `true`).
    pub fn from_env() -> Self {
        Self {
            command_timeout: std::env::var("PROCWIRE_COMMAND_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            close_borrowed_cursors: std::env::var("PROCWIRE_CLOSE_BORROWED_CURSORS")
                .ok()
                .and_then(|s| s.trim().to_ascii_lowercase().parse().ok())
                .unwrap_or(true),
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn with_close_borrowed_cursors(mut self, close: bool) -> Self {
        self.close_borrowed_cursors = close;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_timeout_and_closes_cursors() {
        let config = ExecutorConfig::default();
        assert_eq!(config.command_timeout, None);
        assert!(config.close_borrowed_cursors);
    }

    #[test]
    fn test_builders() {
        let config = ExecutorConfig::default()
            .with_command_timeout(Duration::from_secs(5))
            .with_close_borrowed_cursors(false);
        assert_eq!(config.command_timeout, Some(Duration::from_secs(5)));
        assert!(!config.close_borrowed_cursors);
    }
}
