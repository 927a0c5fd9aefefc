//! Level-tagged line printer.
//!
//! A [`Logger`] is a small value carrying an optional module name and a [`LoggerConfig`].
//! Every call writes one line to standard output. Output failures are swallowed: a
//! logger must never take its host down.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::io::Write as _;

#[cfg(test)]
use std::sync::{Arc, Mutex};

use crate::types::LogLevel;

/// `YYYY/MM/DD HH:MM:SS.mmm`
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.3f";

/// Appended to a `logf` message when one of its arguments failed to format.
pub const FORMAT_ERROR_MARKER: &str = "%!(FORMAT ERROR)";

/// Separator between a parent's module name and a child's.
const CHILD_SEPARATOR: &str = "->";

/// How the Error and Default levels are tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagStyle {
    /// `[E]` and `[I]`
    #[default]
    Service,
    /// `[E!]` and `[ ]`
    Classic,
}

impl TagStyle {
    /// Tag printed for `level` under this style.
    pub fn tag(self, level: LogLevel) -> &'static str {
        match (level, self) {
            (LogLevel::Error, TagStyle::Service) => "[E]",
            (LogLevel::Error, TagStyle::Classic) => "[E!]",
            (LogLevel::Default, TagStyle::Service) => "[I]",
            (LogLevel::Default, TagStyle::Classic) => "[ ]",
            (LogLevel::FromService, _) => "[<-]",
            (LogLevel::ToService, _) => "[->]",
        }
    }
}

/// Configuration for a [`Logger`].
///
/// # Examples
///
/// ```rust
/// use exchange_log::{LoggerConfig, TagStyle};
///
/// // Timestamps, directional tags, [E]/[I]
/// let config = LoggerConfig::default();
///
/// // Bare "[E!] message" lines
/// let config = LoggerConfig::classic();
/// assert_eq!(config.tag_style, TagStyle::Classic);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Prefix every line with a local timestamp
    pub timestamps: bool,
    /// Tag successful exchanges with `[<-]`/`[->]` instead of the Default tag
    pub directional: bool,
    /// Tags used for the Error and Default levels
    pub tag_style: TagStyle,
}

impl LoggerConfig {
    /// No timestamp, no directional tags, `[E!]`/`[ ]`.
    pub fn classic() -> Self {
        Self {
            timestamps: false,
            directional: false,
            tag_style: TagStyle::Classic,
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            timestamps: true,
            directional: true,
            tag_style: TagStyle::Service,
        }
    }
}

#[derive(Debug, Clone, Default)]
enum Output {
    #[default]
    Stdout,
    #[cfg(test)]
    Memory(Arc<Mutex<Vec<String>>>),
}

/// Prints level-tagged lines, optionally attributed to a module.
///
/// Loggers are cheap to clone and are meant to be passed to the components that use
/// them. [`Logger::child`] derives a logger for a sub-component.
///
/// # Examples
///
/// ```rust
/// use exchange_log::{logf, LogLevel, Logger};
///
/// let logger = Logger::new("billing");
/// let invoices = logger.child("invoices");
/// assert_eq!(invoices.module(), Some("billing->invoices"));
///
/// invoices.log(LogLevel::Default, "ready");
/// logf!(invoices, LogLevel::Error, "failed to load invoice {}", 42);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Logger {
    module: Option<String>,
    config: LoggerConfig,
    output: Output,
}

impl Logger {
    /// Create a logger whose lines are attributed to `module`.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            ..Self::default()
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Derive a logger named `<parent>-><name>` sharing this logger's configuration.
    pub fn child(&self, name: &str) -> Self {
        let module = match &self.module {
            Some(parent) => format!("{parent}{CHILD_SEPARATOR}{name}"),
            None => name.to_owned(),
        };
        Self {
            module: Some(module),
            config: self.config.clone(),
            output: self.output.clone(),
        }
    }

    /// Module name printed in front of each message, if any.
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Configuration this logger renders lines with.
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Write one tagged line.
    pub fn log(&self, level: LogLevel, message: &str) {
        let line = self.render(level, message);
        self.emit(&line);
    }

    /// Format `args` and write the result as one tagged line.
    ///
    /// A `Display` or `Debug` impl that reports an error does not abort the call: the
    /// text produced so far is logged, followed by [`FORMAT_ERROR_MARKER`].
    /// Prefer the [`logf!`](crate::logf) macro at call sites.
    pub fn logf(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        let mut message = String::new();
        if message.write_fmt(args).is_err() {
            message.push_str(FORMAT_ERROR_MARKER);
        }
        self.log(level, &message);
    }

    fn render(&self, level: LogLevel, message: &str) -> String {
        let mut line = String::with_capacity(message.len() + 48);
        if self.config.timestamps {
            let _ = write!(line, "{} ", Local::now().format(TIMESTAMP_FORMAT));
        }
        line.push_str(self.config.tag_style.tag(level));
        line.push(' ');
        if let Some(module) = &self.module {
            line.push_str(module);
            line.push_str(": ");
        }
        line.push_str(message);
        line
    }

    fn emit(&self, line: &str) {
        match &self.output {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{line}");
            }
            #[cfg(test)]
            Output::Memory(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(line.to_owned());
                }
            }
        }
    }

    /// Logger that records lines in memory instead of printing them.
    #[cfg(test)]
    pub(crate) fn capturing(config: LoggerConfig) -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let logger = Self {
            module: None,
            config,
            output: Output::Memory(lines.clone()),
        };
        (logger, lines)
    }
}

/// Format and log through a [`Logger`], like `println!` with a level.
///
/// ```rust
/// use exchange_log::{logf, LogLevel, Logger};
///
/// let logger = Logger::default();
/// let status = 503;
/// logf!(logger, LogLevel::Error, "upstream answered {status}");
/// ```
#[macro_export]
macro_rules! logf {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.logf($level, ::std::format_args!($($arg)+))
    };
}
