pub mod algorithm;
pub mod errors;
pub mod trial;

pub use algorithm::*;
pub use errors::*;
pub use trial::*;
