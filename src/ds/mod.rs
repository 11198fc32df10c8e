//! The boxed document.

mod doc;
mod num;

pub use doc::{Doc, DocError, DocKind, MAX_DEPTH};
pub use num::{IntoIntError, Number};
