//! Domain atoms for the gallery backend: models, storage seams, the
//! authorization wrapper and the counter reconciliation logic.
//!
//! Nothing in here builds AWS clients. Callers hand in stores that were
//! constructed once at start-up (or in-memory fakes under the `testing` feature).

pub mod action;
pub mod auth;
pub mod comments;
pub mod error;
pub mod likes;
pub mod photos;
pub mod store;
pub mod users;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use action::ActionResponse;
pub use error::{ActionError, IdentityError, StoreError};
