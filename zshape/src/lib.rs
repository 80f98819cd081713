#![deny(
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    missing_docs
)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]

pub use zshape_core::*;

/// The reference JSON codec.
#[cfg(feature = "json")]
pub use zshape_json as json;
