//! Terminal rendering of tool activity and turn events

pub mod formatter;

pub use formatter::EventFormatter;
