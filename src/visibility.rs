//! Public/private visibility and its mapping onto object ACLs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Group URI that OBS (and S3) use for anonymous access grants.
pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    /// Canned ACL applied on write, copy and `set_visibility`.
    pub fn canned_acl(&self) -> CannedAcl {
        match self {
            Visibility::Public => CannedAcl::PublicRead,
            Visibility::Private => CannedAcl::Private,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(Error::InvalidVisibility(other.to_string())),
        }
    }
}

/// ACLs the adapter writes. Anything richer is only ever read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedAcl {
    Private,
    PublicRead,
}

impl CannedAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grantee {
    CanonicalUser(String),
    Group(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Read,
    Write,
    ReadAcp,
    WriteAcp,
    FullControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub grantee: Grantee,
    pub permission: Permission,
}

impl Grant {
    pub fn new(grantee: Grantee, permission: Permission) -> Self {
        Self {
            grantee,
            permission,
        }
    }

    fn is_public_read(&self) -> bool {
        let everyone = matches!(&self.grantee, Grantee::Group(uri) if uri == ALL_USERS_URI);
        everyone && matches!(self.permission, Permission::Read | Permission::FullControl)
    }
}

/// Grants an owner ends up with after applying `acl`.
pub fn grants_for(acl: CannedAcl, owner: &str) -> Vec<Grant> {
    let mut grants = vec![Grant::new(
        Grantee::CanonicalUser(owner.to_string()),
        Permission::FullControl,
    )];
    if acl == CannedAcl::PublicRead {
        grants.push(Grant::new(
            Grantee::Group(ALL_USERS_URI.to_string()),
            Permission::Read,
        ));
    }
    grants
}

/// Map an object ACL back to a visibility.
///
/// Public when anonymous users hold a read-capable grant, private otherwise.
/// Custom multi-grant ACLs are reduced with the same rule; other grants are
/// ignored.
pub fn visibility_from_grants(grants: &[Grant]) -> Visibility {
    if grants.iter().any(Grant::is_public_read) {
        Visibility::Public
    } else {
        Visibility::Private
    }
}
