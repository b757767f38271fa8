pub mod builder;
pub mod data_flow;
pub mod engine;
mod extract;
pub mod location;
pub mod parser;
mod walker;

pub use builder::*;
pub use data_flow::*;
pub use engine::*;
pub use location::*;
pub use parser::*;
