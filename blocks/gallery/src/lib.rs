//! Gallery server actions. Each action gates on the request-scoped identity,
//! runs the atom services and projects the outcome into an `ActionResponse`.

pub mod account;
pub mod comments;
pub mod photos;
