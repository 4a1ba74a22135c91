//! Terminal output for the bootstrapper.

pub mod console;
pub mod theme;

pub use console::ConsoleReporter;
pub use theme::{Theme, format_size};
