//! Progress reporting.
//!
//! The scheduler calls a user-supplied callback with `(day, total_days)` once each simulated day
//! is complete. With the `progress_bar` feature, [`init_day_progress_bar`] and
//! [`update_day_progress`] drive a terminal progress bar from such a callback:
//!
//! ```ignore
//! init_day_progress_bar(params.simulation_days);
//! context.set_progress_callback(|day, _| update_day_progress(day));
//! ```
use crate::context::{Context, ContextBase};
use crate::define_data_plugin;
use crate::log::trace;
#[cfg(feature = "progress_bar")]
use progress_bar::{
    finalize_progress_bar, init_progress_bar, set_progress_bar_action,
    set_progress_bar_progress, Color, Style,
};
#[cfg(feature = "progress_bar")]
use std::sync::OnceLock;

type ProgressCallback = Box<dyn FnMut(usize, usize)>;

define_data_plugin!(ProgressPlugin, Option<ProgressCallback>, None);

pub trait ContextProgressExt {
    /// Installs a callback invoked with `(day, total_days)` after every simulated day, replacing
    /// any previous one.
    fn set_progress_callback(&mut self, callback: impl FnMut(usize, usize) + 'static);

    /// Invokes the progress callback, if there is one.
    fn report_progress(&mut self, day: usize, total_days: usize);
}

impl ContextProgressExt for Context {
    fn set_progress_callback(&mut self, callback: impl FnMut(usize, usize) + 'static) {
        trace!("installing progress callback");
        *self.get_data_mut(ProgressPlugin) = Some(Box::new(callback));
    }

    fn report_progress(&mut self, day: usize, total_days: usize) {
        if let Some(callback) = self.get_data_mut(ProgressPlugin) {
            callback(day, total_days);
        }
    }
}

/// The number of days the progress bar was initialized with.
#[cfg(feature = "progress_bar")]
static TOTAL_DAYS: OnceLock<usize> = OnceLock::new();

/// Initialize the progress bar with the number of days to simulate. Only one bar can be set up
/// per process; later calls are ignored.
#[cfg(feature = "progress_bar")]
pub fn init_day_progress_bar(total_days: usize) {
    if TOTAL_DAYS.set(total_days).is_err() {
        crate::log::warn!("day progress bar already initialized");
        return;
    }
    trace!("initializing day progress bar for {total_days} days");
    init_progress_bar(total_days);
    set_progress_bar_action("Day", Color::Blue, Style::Bold);
}

/// Moves the progress bar to `day`, finalizing it on the last day.
#[cfg(feature = "progress_bar")]
pub fn update_day_progress(day: usize) {
    let Some(total_days) = TOTAL_DAYS.get() else {
        crate::log::warn!("attempted to update day progress bar before it was initialized");
        return;
    };
    let day = day.min(*total_days);
    set_progress_bar_progress(day);
    if day == *total_days {
        finalize_progress_bar();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn no_callback_is_fine() {
        let mut context = Context::new();
        context.report_progress(1, 10);
    }

    #[test]
    fn callback_receives_progress() {
        let mut context = Context::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        context.set_progress_callback(move |day, total| sink.borrow_mut().push((day, total)));
        context.report_progress(1, 3);
        context.report_progress(2, 3);
        assert_eq!(*seen.borrow(), vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn callback_is_replaced() {
        let mut context = Context::new();
        let count = Rc::new(RefCell::new(0));
        let first = Rc::clone(&count);
        context.set_progress_callback(move |_, _| *first.borrow_mut() += 1);
        let second = Rc::clone(&count);
        context.set_progress_callback(move |_, _| *second.borrow_mut() += 10);
        context.report_progress(1, 1);
        assert_eq!(*count.borrow(), 10);
    }
}
