//! The generic CRUD resource contract shared by every list screen.

use crate::error::{ApiError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Client-side checks that run before a payload leaves the machine.
pub trait Validate {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// A backend collection with list/create/update/delete endpoints.
pub trait Resource: DeserializeOwned + Serialize + Clone + Debug {
    /// Path segment under `/api`, e.g. `companies`
    const PATH: &'static str;
    /// Human label used in logs and messages
    const LABEL: &'static str;

    type Create: Serialize + DeserializeOwned + Validate + Debug;
    /// Only the fields the edit form exposes
    type Update: Serialize + DeserializeOwned + Validate + Debug;

    fn id(&self) -> i64;
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn require_selected(field: &str, id: i64) -> Result<()> {
    if id <= 0 {
        return Err(ApiError::Validation(format!("Please select a {}", field)));
    }
    Ok(())
}

pub(crate) fn require_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(ApiError::Validation(format!(
            "{} must be between {} and {}",
            field, min, max
        )));
    }
    Ok(())
}
