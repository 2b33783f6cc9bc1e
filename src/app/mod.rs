//! Application runtime composition modules.

pub(crate) mod exit_handler;
pub(crate) mod progress_manager;
pub(crate) mod runtime;
pub(crate) mod shutdown;
pub(crate) mod terminal;
