pub mod diagnostic;
pub mod geometry;
pub mod highlight;
pub mod scene;
pub mod state;

pub use state::{ClickOutcome, EngineContext};
