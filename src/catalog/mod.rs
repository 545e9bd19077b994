pub mod batch;
pub mod error;
pub mod ops;

pub use batch::*;
pub use error::*;
pub use ops::*;
