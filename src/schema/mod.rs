//! Input table schema
//!
//! This module defines the expected columns of the phone-usage dataset and the
//! adapter that turns delimited text into validated observations.

mod adapter;
mod columns;

pub use adapter::*;
pub use columns::*;
