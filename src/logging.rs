//! Log output for the `tagwarden` binary
//!
//! Events go to stderr; stdout carries only reports and JSON. `TAGWARDEN_LOG`
//! takes directives such as `tagwarden::execute=trace`, and `RUST_LOG` is
//! honoured when it is unset. Without either, `-v`/`-q` pick the level.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Filter directives read before `RUST_LOG`
pub const LOG_ENV: &str = "TAGWARDEN_LOG";

/// How chatty the CLI is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    /// Per-operation events, with targets and uptime stamps
    Verbose,
}

impl Verbosity {
    /// `-v` beats `-q` (clap already rejects the pair on the command line).
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => Self::Verbose,
            (false, true) => Self::Quiet,
            (false, false) => Self::Normal,
        }
    }

    /// Directives used when neither environment variable is set.
    /// Other crates are held at `warn`.
    fn directives(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn,tagwarden=info",
            Self::Verbose => "warn,tagwarden=debug",
        }
    }

    fn filter(self) -> EnvFilter {
        let from_env = std::env::var(LOG_ENV)
            .ok()
            .and_then(|directives| EnvFilter::try_new(directives).ok());
        from_env
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new(self.directives()))
    }
}

/// Install the global subscriber. Returns `false` when one is already set.
pub fn init_subscriber(verbosity: Verbosity, no_color: bool) -> bool {
    let ansi = !no_color && std::io::IsTerminal::is_terminal(&std::io::stderr());
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(verbosity == Verbosity::Verbose);

    let registry = tracing_subscriber::registry().with(verbosity.filter());
    let installed = match verbosity {
        Verbosity::Verbose => registry.with(layer.with_timer(fmt::time::uptime())).try_init(),
        _ => registry.with(layer.without_time().compact()).try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_takes_precedence() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn quiet_silences_everything_but_errors() {
        assert_eq!(Verbosity::Quiet.directives(), "error");
        assert_eq!(Verbosity::Normal.directives(), "warn,tagwarden=info");
        assert_eq!(Verbosity::Verbose.directives(), "warn,tagwarden=debug");
    }

    #[test]
    fn every_default_parses() {
        for v in [Verbosity::Quiet, Verbosity::Normal, Verbosity::Verbose] {
            assert!(EnvFilter::try_new(v.directives()).is_ok(), "{:?}", v);
        }
    }
}
