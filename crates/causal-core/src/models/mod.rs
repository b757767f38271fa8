pub mod http;
pub mod source;

pub use http::*;
pub use source::*;
