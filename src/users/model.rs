//! User record and list filter types.

use serde::{Deserialize, Serialize};

/// A user record as stored and exchanged over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique key in the store.
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: i32,
    #[serde(default)]
    pub is_customer: bool,
}

impl User {
    pub fn new(
        id: i32,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: i32,
        is_customer: bool,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            age,
            is_customer,
        }
    }

    /// Case-insensitive substring match on either name.
    ///
    /// `needle` must already be lowercased.
    fn name_contains(&self, needle: &str) -> bool {
        self.first_name.to_lowercase().contains(needle)
            || self.last_name.to_lowercase().contains(needle)
    }
}

/// Query filters for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    pub search: Option<String>,
    pub is_customer: Option<bool>,
}

impl ListFilter {
    /// Build a predicate applying the customer flag first, then the name search.
    pub fn predicate(&self) -> impl Fn(&User) -> bool + '_ {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        move |user: &User| {
            if let Some(flag) = self.is_customer {
                if user.is_customer != flag {
                    return false;
                }
            }
            match &needle {
                Some(term) => user.name_contains(term),
                None => true,
            }
        }
    }
}
