/*!
Injected logging capability.

Components never call a global logger directly; they receive a
`SharedLogger` at construction time. The default `LogFacade` forwards to the
`log` crate so hosts pick the backend (env_logger, a GUI console, ...);
`NullLogger` discards everything.
*/

use std::fmt;
use std::rc::Rc;

/// Narrow line-sink interface used by every subsystem.
pub trait Logger {
    fn debug(&self, args: fmt::Arguments<'_>);
    fn warn(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

/// Shared, read-only handle passed to constructors.
pub type SharedLogger = Rc<dyn Logger>;

/// Forwards to the `log` facade under the `lockstep` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn debug(&self, args: fmt::Arguments<'_>) {
        log::debug!(target: "lockstep", "{args}");
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        log::warn!(target: "lockstep", "{args}");
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        log::error!(target: "lockstep", "{args}");
    }
}

/// Discards all output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _args: fmt::Arguments<'_>) {}
    fn warn(&self, _args: fmt::Arguments<'_>) {}
    fn error(&self, _args: fmt::Arguments<'_>) {}
}

pub fn log_facade() -> SharedLogger {
    Rc::new(LogFacade)
}

pub fn null_logger() -> SharedLogger {
    Rc::new(NullLogger)
}

#[cfg(test)]
pub(crate) mod capture {
    use super::*;
    use std::cell::RefCell;

    /// Records warnings so tests can assert on recovered conditions.
    #[derive(Default)]
    pub(crate) struct CaptureLogger {
        pub(crate) warnings: RefCell<Vec<String>>,
    }

    impl Logger for CaptureLogger {
        fn debug(&self, _args: fmt::Arguments<'_>) {}
        fn warn(&self, args: fmt::Arguments<'_>) {
            self.warnings.borrow_mut().push(args.to_string());
        }
        fn error(&self, args: fmt::Arguments<'_>) {
            self.warnings.borrow_mut().push(args.to_string());
        }
    }
}
