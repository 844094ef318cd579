//! Format implementations
//!
//! This module contains all format implementations that convert between
//! the flat container model and its text representations.

pub mod eds;
pub mod json;
pub mod treeviz;
pub mod yaml;

pub use eds::EdsFormat;
pub use json::JsonFormat;
pub use treeviz::TreevizFormat;
pub use yaml::YamlFormat;
