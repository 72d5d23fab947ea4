pub mod entity;
pub mod error;
pub mod naming;
pub mod port;

pub use entity::*;
pub use error::DomainError;
pub use naming::*;
pub use port::*;
