//! Pipeline module - the training stages and their composition

pub mod config;
pub mod evaluate;
pub mod forest;
pub mod generator;
pub mod persist;
pub mod preprocess;
pub mod runner;
pub mod scaler;
pub mod tree;

pub use config::*;
pub use evaluate::*;
pub use forest::*;
pub use generator::*;
pub use persist::*;
pub use preprocess::*;
pub use runner::*;
pub use scaler::StandardScaler;
pub use tree::{DecisionTree, TreeParams};
