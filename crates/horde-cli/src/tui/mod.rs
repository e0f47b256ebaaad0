//! Minimal terminal application runtime.
//!
//! An [`App`] is driven by three kinds of events: ticks at a fixed rate (game
//! logic), renders (drawing), and terminal input. The [`Runtime`] owns the
//! terminal for the duration of [`Runtime::run`] and restores it afterwards.

pub use self::{app::App, event_loop::RenderMode, runtime::Runtime};

mod app;
mod event_loop;
mod runtime;
