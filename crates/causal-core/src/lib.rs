pub mod cache;
pub mod call_graph;
pub mod data_flow;
pub mod error;
pub mod features;
pub mod impact;
pub mod labels;
pub mod layers;
pub mod logging;
pub mod models;
pub mod sequence;
pub mod service;

pub use error::{CausalError, CausalResult};
pub use logging::{init, init_default, init_from_args};
