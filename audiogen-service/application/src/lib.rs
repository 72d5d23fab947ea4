pub mod clock;
pub mod dto;
pub mod error;
pub mod outcome;
pub mod usecase;
pub mod validation;

pub use clock::*;
pub use dto::*;
pub use error::*;
pub use outcome::*;
pub use usecase::*;
pub use validation::validate_request;
