//! Type definitions

pub mod duty;
pub mod messages;
pub mod plan;
pub mod route;
pub mod timeline;
pub mod trip;

pub use duty::*;
pub use messages::*;
pub use plan::*;
pub use route::*;
pub use timeline::*;
pub use trip::*;
