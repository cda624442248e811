//! Foundation: math types shared by every layer, and logging setup for
//! library users that don't install their own `log` sink.

pub mod logging;
pub mod math;
