//! Generation options and the console output channels
//!
//! Every user-facing message produced by the core goes through one of four
//! channels held by [`GenerationOptions`]. The console channels render with
//! termcolor; tests swap in recording closures.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// A single output channel
pub type MessageFn = Arc<dyn Fn(&str) + Send + Sync>;

/// The four channels the core reports through
#[derive(Clone)]
pub struct OutputChannels {
    pub debug: MessageFn,
    pub log: MessageFn,
    pub warn: MessageFn,
    pub error: MessageFn,
}

impl OutputChannels {
    /// Channels that print to the terminal, suppressed according to the flags
    pub fn console(debug: bool, no_warnings: bool) -> Self {
        Self {
            debug: if debug {
                Arc::new(|message: &str| print_colored(Stream::Stdout, Some(Color::Magenta), message))
            } else {
                silent()
            },
            log: Arc::new(|message: &str| print_colored(Stream::Stdout, None, message)),
            warn: if no_warnings {
                silent()
            } else {
                Arc::new(|message: &str| print_colored(Stream::Stderr, Some(Color::Yellow), message))
            },
            error: Arc::new(|message: &str| print_colored(Stream::Stderr, Some(Color::Red), message)),
        }
    }

    /// Channels that discard everything
    pub fn silent() -> Self {
        Self {
            debug: silent(),
            log: silent(),
            warn: silent(),
            error: silent(),
        }
    }
}

fn silent() -> MessageFn {
    Arc::new(|_: &str| {})
}

enum Stream {
    Stdout,
    Stderr,
}

fn print_colored(stream: Stream, color: Option<Color>, message: &str) {
    let mut out = match stream {
        Stream::Stdout => StandardStream::stdout(ColorChoice::Auto),
        Stream::Stderr => StandardStream::stderr(ColorChoice::Auto),
    };
    if let Some(color) = color {
        let _ = out.set_color(ColorSpec::new().set_fg(Some(color)));
    }
    let _ = writeln!(out, "{message}");
    let _ = out.reset();
}

/// Immutable per-invocation options bundle
#[derive(Clone)]
pub struct GenerationOptions {
    debug: bool,
    summarize: bool,
    no_warnings: bool,
    channels: OutputChannels,
}

impl GenerationOptions {
    /// Options with console channels derived from the flags
    pub fn new(debug: bool, summarize: bool, no_warnings: bool) -> Self {
        Self {
            debug,
            summarize,
            no_warnings,
            channels: OutputChannels::console(debug, no_warnings),
        }
    }

    /// Options reporting through caller-supplied channels.
    ///
    /// Suppression still applies: with `no_warnings` the warn channel is never
    /// called, and without `debug` the debug channel is never called.
    pub fn with_channels(
        debug: bool,
        summarize: bool,
        no_warnings: bool,
        channels: OutputChannels,
    ) -> Self {
        Self {
            debug,
            summarize,
            no_warnings,
            channels,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn summarize(&self) -> bool {
        self.summarize
    }

    pub fn no_warnings(&self) -> bool {
        self.no_warnings
    }

    pub fn debug(&self, message: &str) {
        if self.debug {
            (self.channels.debug)(message);
        }
    }

    pub fn log(&self, message: &str) {
        (self.channels.log)(message);
    }

    /// Log only when not summarizing
    pub fn step(&self, message: &str) {
        if !self.summarize {
            self.log(message);
        }
    }

    pub fn warn(&self, message: &str) {
        if !self.no_warnings {
            (self.channels.warn)(message);
        }
    }

    /// Report a fatal error. Termination is left to the caller.
    pub fn error(&self, message: &str) {
        (self.channels.error)(message);
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::new(false, false, false)
    }
}

impl fmt::Debug for GenerationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationOptions")
            .field("debug", &self.debug)
            .field("summarize", &self.summarize)
            .field("no_warnings", &self.no_warnings)
            .finish_non_exhaustive()
    }
}
