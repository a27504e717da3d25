//! Domain services for jornada: the plan-creation wizard, AI generation,
//! the 21-day plan aggregate, credits, users, and tenant resolution.
//!
//! Every service takes an explicit `&dyn RecordStore` and, where a caller
//! is involved, a [`session::Session`]. Nothing here holds global state.

pub mod credits;
pub mod error;
pub mod generate;
pub mod plan;
pub mod session;
pub mod tenant;
pub mod token;
pub mod users;
pub mod wizard;

pub use error::{ServiceError, ValidationError};
pub use session::Session;
