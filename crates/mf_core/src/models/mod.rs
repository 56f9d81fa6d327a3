//! Domain models: events, possessions and the output feature table.

pub mod event;
pub mod feature;
pub mod possession;

pub use event::*;
pub use feature::*;
pub use possession::*;
