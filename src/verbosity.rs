use log::LevelFilter;

/// Runtime log level switch behind `--verbose` and the trace `v` command.
///
/// The quiet level comes from the environment, the loud one is at least
/// `Debug`. Toggling never lowers output below what the environment asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verbosity {
    quiet: LevelFilter,
    loud: LevelFilter,
    on: bool,
}

impl Verbosity {
    /// `env` is the raw value of the level variable; unparsable or missing
    /// values fall back to `Warn`.
    pub fn new(env: Option<&str>, verbose: bool) -> Self {
        let quiet = env
            .and_then(|v| v.trim().parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Warn);
        Verbosity {
            quiet,
            loud: quiet.max(LevelFilter::Debug),
            on: verbose,
        }
    }

    pub fn level(&self) -> LevelFilter {
        if self.on { self.loud } else { self.quiet }
    }

    pub fn is_verbose(&self) -> bool {
        self.on
    }

    pub fn toggle(&mut self) -> LevelFilter {
        self.on = !self.on;
        self.level()
    }
}
