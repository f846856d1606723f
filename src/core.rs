//! Conversion engine: converters, dispatcher and per-field input coalescing

pub mod features;
pub mod session;

pub use features::{ConversionDispatcher, format_result};
pub use session::{FieldSession, InputCoalescer};
