pub mod frame;
pub mod indicators;
pub mod summary;


pub use frame::*;
pub use indicators::*;
pub use summary::*;
