pub mod job;
pub mod window;

pub use job::*;
pub use window::*;
