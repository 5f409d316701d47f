mod dedup;
mod roles;

pub use dedup::{PersonDeduplicator, PersonIdentityGroup};
pub use roles::{MainRole, RoleAssignment, RoleResolver, RoleState, SubRole};
