pub mod handlers;
pub mod render;
pub mod types;

pub use handlers::*;
pub use types::*;
