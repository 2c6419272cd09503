use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::{Entity, UserId};

/// Rejected profile change. The user is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("name is required")]
    NameRequired,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

/// A registered storefront user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub street_name: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub email: Option<String>,
}

/// Partial update of a user's contact information.
///
/// `None` leaves a field unchanged; `Some("")` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub street_name: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            street_name: None,
            zip: None,
            city: None,
            email: None,
        }
    }

    /// Validate and apply a contact update atomically.
    pub fn apply_contact_update(&mut self, update: ContactUpdate) -> Result<(), ProfileError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(ProfileError::NameRequired);
            }
        }
        if let Some(email) = &update.email {
            if !email.is_empty() && !is_valid_email(email) {
                return Err(ProfileError::InvalidEmail(email.clone()));
            }
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        assign_optional(&mut self.street_name, update.street_name);
        assign_optional(&mut self.zip, update.zip);
        assign_optional(&mut self.city, update.city);
        assign_optional(&mut self.email, update.email);
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn assign_optional(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        let trimmed = value.trim();
        *field = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !email.chars().any(char::is_whitespace)
}
