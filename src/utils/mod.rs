//! Terminal output helpers

mod progress;
mod reporter;
mod styling;

pub use progress::*;
pub use reporter::Reporter;
pub use styling::*;
