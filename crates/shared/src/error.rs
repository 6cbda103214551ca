use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}', expected 'admin' or 'ops'")]
pub struct ParseRoleError(pub String);

/// Wizard inputs that can carry an inline validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    FullName,
    Email,
    Department,
    Role,
    EmployeeId,
    Photo,
    EmploymentType,
    OfficeLocation,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::FullName => "Full Name",
            FormField::Email => "Email",
            FormField::Department => "Department",
            FormField::Role => "Role",
            FormField::EmployeeId => "Employee ID",
            FormField::Photo => "Photo",
            FormField::EmploymentType => "Employment Type",
            FormField::OfficeLocation => "Office Location",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn required(field: FormField) -> Self {
        Self::new(field, format!("{} is required", field.label()))
    }
}
