mod requests;
mod tasks;

pub use requests::*;
pub use tasks::*;
