//! Response construction helpers.

mod builder;

pub use builder::{JsonResponseBuilder, APPLICATION_JSON};
