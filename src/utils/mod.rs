//! Small shared helpers.

pub mod date;
pub mod markdown;
pub mod minify;
pub mod path;
pub mod value;
pub mod walk;
