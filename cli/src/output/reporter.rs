//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.
//!
//! On a TTY each step runs under a spinner which is closed with a check mark
//! when the next step starts. Elsewhere steps are plain lines.

use std::cell::RefCell;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` starts a spinner, or prints `"  → {message}"` off a TTY
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ⚠ {message}"` above any running spinner
///
/// Everything is suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    active: RefCell<Option<(ProgressBar, String)>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            active: RefCell::new(None),
        }
    }

    fn close_step(&self) {
        if let Some((pb, msg)) = self.active.borrow_mut().take() {
            progress::finish_ok(&pb, &msg);
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        self.close_step();
        if self.ctx.show_progress() {
            let pb = progress::spinner(message);
            *self.active.borrow_mut() = Some((pb, message.to_string()));
        } else {
            println!("  {} {message}", "→".style(self.ctx.styles.info));
        }
    }

    fn success(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        self.close_step();
        self.ctx.success(message);
    }

    fn warn(&self, message: &str) {
        match &*self.active.borrow() {
            Some((pb, _)) => pb.suspend(|| self.ctx.warn(message)),
            None => self.ctx.warn(message),
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        // an unfinished step means the run failed
        if let Some((pb, msg)) = self.active.get_mut().take() {
            progress::finish_error(&pb, &msg);
        }
    }
}
