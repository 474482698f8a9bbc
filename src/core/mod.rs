pub mod data;
pub mod errors;
pub mod explanation;

pub use data::*; // Re-export common data types
pub use errors::*;
pub use explanation::Explanation;
