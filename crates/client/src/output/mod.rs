//! Output formatting functions.

pub mod json;
pub mod pretty;
