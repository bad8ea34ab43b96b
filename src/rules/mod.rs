//! Pure attendance and calendar rules, free of I/O.

pub mod face;
pub mod recurrence;
pub mod window;
