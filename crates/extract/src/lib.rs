mod consts;
pub mod error;
pub mod models;
mod title;

pub use crate::title::{Numbering, parse, strip_annotations};
