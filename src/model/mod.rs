pub mod filter;
pub mod spell;

pub use filter::*;
pub use spell::*;
