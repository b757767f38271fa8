pub mod analyzer;
pub mod reverse_dependency;
pub mod risk;

pub use analyzer::*;
pub use reverse_dependency::*;
pub use risk::*;
