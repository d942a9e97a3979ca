//! Domain models for Rule Track

pub mod rule;
pub mod selection;
pub mod track;

pub use rule::*;
pub use selection::*;
pub use track::*;
