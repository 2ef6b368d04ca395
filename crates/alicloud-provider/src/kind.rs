//! Resource kinds served by the provider

use std::fmt;
use std::str::FromStr;

use alicloud_core::Error;
use serde::{Deserialize, Serialize};

/// Closed set of resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceKind {
    /// `alicloud_ram_login_profile`
    RamLoginProfile,
    /// `alicloud_fc_function`
    FcFunction,
}

impl ResourceKind {
    /// Every kind, in registration order
    pub const ALL: [ResourceKind; 2] = [ResourceKind::RamLoginProfile, ResourceKind::FcFunction];

    /// Terraform type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::RamLoginProfile => alicloud_ram::RESOURCE_TYPE,
            ResourceKind::FcFunction => alicloud_fc::RESOURCE_TYPE,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::ALL.iter().map(|k| k.type_name()).collect();
                Error::config(format!(
                    "Resource type '{}' is not supported. Supported types: {}",
                    s,
                    supported.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for ResourceKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.type_name().to_string()
    }
}
