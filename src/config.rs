//! Tolerances and runtime settings.

/// Fit tolerance in centimeters.
///
/// Piece sizes come from frame geometry sums like `40 + 2 * 2.5 + 2 * 0.3`,
/// so exact float comparisons would reject cuts that fit on paper.
pub const EPS: f64 = 0.0001;

/// Upper bound on pieces in one plan, summed over all order lines.
pub const MAX_PIECES: u32 = 10_000;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_LOG_FILE: &str = "development.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// `a <= b` within [`EPS`].
#[inline]
pub fn fits(a: f64, b: f64) -> bool {
    a <= b + EPS
}

/// Settings for the HTTP server, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub log_file: String,
    pub log_level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_file: DEFAULT_LOG_FILE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            sentry_dsn: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unparseable or empty values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            port: non_empty("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            log_file: non_empty("LOG_FILE").unwrap_or(defaults.log_file),
            log_level: non_empty("LOG_LEVEL").unwrap_or(defaults.log_level),
            sentry_dsn: non_empty("SENTRY_DSN"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
