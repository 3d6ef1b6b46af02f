pub mod cancellation;
pub mod entities;
pub mod errors;
pub mod ports;

pub use cancellation::CancellationToken;
pub use entities::*;
pub use errors::{DomainError, Result};
