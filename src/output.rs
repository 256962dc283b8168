//! # Output Configuration
//!
//! Decides how the CLI talks to the terminal: whether to use color and
//! emoji, and which [`ProgressSink`] renders fetch progress.
//!
//! Color follows `--color=always|never|auto`. In auto mode it is turned off by
//! `NO_COLOR`, `CLICOLOR=0` or `TERM=dumb`, forced on by `CLICOLOR_FORCE=1`,
//! and otherwise left to `console`'s TTY detection.

use std::env;

use console::style;

use crate::progress::{LogProgress, ProgressSink, SpinnerProgress};

/// How the CLI renders its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub use_color: bool,
    /// Stdout is an interactive terminal.
    pub interactive: bool,
}

impl OutputConfig {
    /// Builds the configuration from the `--color` flag and the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let term = console::Term::stdout();
        let use_color = match color_flag.to_ascii_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => color_from_env().unwrap_or_else(|| term.features().colors_supported()),
        };
        Self {
            use_color,
            interactive: term.is_term(),
        }
    }

    pub fn plain() -> Self {
        Self {
            use_color: false,
            interactive: false,
        }
    }

    /// Spinners on an interactive terminal, log lines otherwise.
    pub fn progress_sink(&self, quiet: bool) -> Box<dyn ProgressSink> {
        if self.interactive && !quiet {
            Box::new(SpinnerProgress::new())
        } else {
            Box::new(LogProgress)
        }
    }

    /// A success line, `✅ message` or `[OK] message`.
    pub fn success(&self, message: &str) -> String {
        if self.use_color {
            format!("{} {}", emoji(self, "✅", "[OK]"), style(message).green())
        } else {
            format!("{} {}", emoji(self, "✅", "[OK]"), message)
        }
    }

    /// A failure line, `❌ message` or `[FAILED] message`.
    pub fn failure(&self, message: &str) -> String {
        if self.use_color {
            format!("{} {}", emoji(self, "❌", "[FAILED]"), style(message).red().bold())
        } else {
            format!("{} {}", emoji(self, "❌", "[FAILED]"), message)
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// `Some(_)` when the environment decides color on its own.
fn color_from_env() -> Option<bool> {
    // Any NO_COLOR value, even empty, disables color.
    if env::var_os("NO_COLOR").is_some() {
        return Some(false);
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return Some(false);
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
        return Some(true);
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return Some(false);
    }
    None
}

/// Picks the emoji when color is on, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}
