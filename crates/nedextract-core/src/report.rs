use serde::{Deserialize, Serialize};

use crate::orgs::TrueOrganization;
use crate::persons::{MainRole, PersonIdentityGroup, RoleAssignment, SubRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRow {
    pub document: String,
    pub organization: Option<String>,
    pub name: String,
    pub variants: Vec<String>,
    pub main_role: Option<MainRole>,
    pub sub_role: Option<SubRole>,
    pub ambassador: bool,
}

impl PersonRow {
    #[must_use]
    pub fn new(
        document: &str,
        organization: Option<&str>,
        group: &PersonIdentityGroup,
        assignment: &RoleAssignment,
    ) -> Self {
        Self {
            document: document.to_string(),
            organization: organization.map(String::from),
            name: group.canonical.clone(),
            variants: group.variants.clone(),
            main_role: assignment.main_role(),
            sub_role: assignment.sub_role(),
            ambassador: assignment.ambassador,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRow {
    pub document: String,
    pub name: String,
    pub mentions: usize,
    pub registry_id: Option<String>,
}

impl OrganizationRow {
    #[must_use]
    pub fn new(document: &str, org: &TrueOrganization) -> Self {
        Self {
            document: document.to_string(),
            name: org.name.clone(),
            mentions: org.mentions,
            registry_id: org.registry_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRow {
    pub document: String,
    pub organization: Option<String>,
    pub sector: Option<String>,
}

/// Rows accumulated over any number of documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultTables {
    pub persons: Vec<PersonRow>,
    pub organizations: Vec<OrganizationRow>,
    pub sectors: Vec<SectorRow>,
}

impl ResultTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, other: Self) {
        self.persons.extend(other.persons);
        self.organizations.extend(other.organizations);
        self.sectors.extend(other.sectors);
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.organizations.is_empty() && self.sectors.is_empty()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
