mod adjudicator;
mod matcher;

pub use adjudicator::{
    main_organization, Decision, OrganizationAdjudicator, Reason, TrueOrganization,
};
pub use matcher::{OrganizationMatcher, Registry, RegistryEntry, RegistryError, RegistryResult};
