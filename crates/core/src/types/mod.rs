pub mod event;
pub mod launch;
pub mod phase;
pub mod plan;
pub mod primitives;

pub use event::*;
pub use launch::*;
pub use phase::*;
pub use plan::*;
pub use primitives::*;
