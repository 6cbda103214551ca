use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseRoleError;

/// Placeholder rendered for identity or detail fields that have no value.
pub const PLACEHOLDER: &str = "—";

/// Who is filling in the wizard. Admins see both steps, ops only the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Admin,
    Ops,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Ops => "ops",
        }
    }

    pub fn sees_basic_info(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("admin") {
            Ok(Role::Admin)
        } else if trimmed.eq_ignore_ascii_case("ops") {
            Ok(Role::Ops)
        } else {
            Err(ParseRoleError(trimmed.to_string()))
        }
    }
}

/// Identity record written in step 1 by an admin.
///
/// `role` is the employee's job title (e.g. "Engineer"), not the wizard [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub role: String,
    pub employee_id: String,
}

/// Step 2 record. `email` and `employee_id` only exist to join against [`BasicInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    pub photo: String,
    pub employment_type: String,
    pub office_location: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

/// In-progress step 1 form. Every field may still be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicInfoForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

impl BasicInfoForm {
    /// Returns the submittable record once every field is filled in.
    pub fn to_record(&self) -> Option<BasicInfo> {
        Some(BasicInfo {
            full_name: filled(&self.full_name)?,
            email: filled(&self.email)?,
            department: filled(&self.department)?,
            role: filled(&self.role)?,
            employee_id: filled(&self.employee_id)?,
        })
    }
}

/// In-progress step 2 form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailsForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

impl DetailsForm {
    /// Builds the submittable record, borrowing join identity from `identity` when present.
    pub fn to_record(&self, identity: Option<&BasicInfoForm>) -> Option<Details> {
        Some(Details {
            photo: filled(&self.photo)?,
            employment_type: filled(&self.employment_type)?,
            office_location: filled(&self.office_location)?,
            notes: self.notes.clone().unwrap_or_default(),
            email: identity.and_then(|info| info.email.clone()),
            employee_id: identity.and_then(|info| info.employee_id.clone()),
        })
    }
}

fn filled(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Role-scoped snapshot of wizard state kept in the client-side store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_info: Option<BasicInfoForm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<DetailsForm>,
}

/// Autocomplete candidate as returned by `/departments` and `/locations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: i64,
    pub name: String,
}

pub type Department = Suggestion;
pub type Location = Suggestion;

/// Listing row: a [`BasicInfo`] blended with its matching [`Details`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub role: String,
    pub employee_id: String,
    pub photo: String,
    pub employment_type: String,
    pub office_location: String,
    pub notes: String,
}
