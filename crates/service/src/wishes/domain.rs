use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Who may see a wishlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Private,
    DirectLink,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::DirectLink => "direct_link",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "direct_link" => Ok(Visibility::DirectLink),
            "public" => Ok(Visibility::Public),
            other => Err(ServiceError::Validation(format!("unknown visibility {other:?}"))),
        }
    }
}

/// Stored wishlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistRecord {
    pub uuid: Uuid,
    pub wisher_uuid: Uuid,
    pub name: String,
    pub visibility: Visibility,
    pub position: i32,
}

/// Stored wish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishRecord {
    pub uuid: Uuid,
    pub wishlist_uuid: Uuid,
    pub description: String,
    pub fulfilled: bool,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wish {
    pub description: String,
    pub fulfilled: bool,
}

impl From<WishRecord> for Wish {
    fn from(record: WishRecord) -> Self {
        Self {
            description: record.description,
            fulfilled: record.fulfilled,
        }
    }
}

/// A wishlist with its wishes, in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    pub name: String,
    pub visibility: Visibility,
    pub wishes: Vec<Wish>,
}
