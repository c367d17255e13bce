use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Logging settings: `ENVIRONMENT`, `LOG_LEVEL`, `LOG_DIR`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub production: bool,
    pub level: LogLevel,
    /// Daily-rotated `app.log` and `error.log` land here.
    pub directory: PathBuf,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let production = std::env::var("ENVIRONMENT").is_ok_and(|e| e == "production");
        Self::resolve(
            production,
            std::env::var("LOG_LEVEL").ok().as_deref(),
            std::env::var("LOG_DIR").ok(),
        )
    }

    /// Unknown or missing levels fall back to `info` in production and
    /// `debug` elsewhere.
    fn resolve(production: bool, level: Option<&str>, directory: Option<String>) -> Self {
        let fallback = if production {
            LogLevel::Info
        } else {
            LogLevel::Debug
        };
        Self {
            production,
            level: level.and_then(|l| l.parse().ok()).unwrap_or(fallback),
            directory: directory
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
        }
    }

    /// Default filter directive when `RUST_LOG` is unset.
    pub fn directive(&self) -> String {
        format!("blog_api={},tower_http=info,sqlx=warn", self.level)
    }
}
