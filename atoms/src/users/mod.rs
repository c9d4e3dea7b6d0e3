pub mod model;

pub use model::{GroupMembership, ManagedUser, ServerUser, UserGroup, ADMIN_ROLE};
