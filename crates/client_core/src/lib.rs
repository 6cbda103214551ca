//! Headless client logic for the employee registration wizard and listing.

pub mod api;
pub mod autocomplete;
pub mod debounce;
pub mod directory;
pub mod employee_id;
pub mod navigation;
pub mod wizard;

pub use api::{
    ClientApiError, DepartmentSuggestions, EmployeeApi, HttpEmployeeApi, LocationSuggestions,
    SuggestionSource,
};
pub use autocomplete::{AutocompleteField, DropdownState, FieldSnapshot};
pub use debounce::Debouncer;
pub use directory::{merge_employees, paginate, EmployeeDirectory, ListingView, Page};
pub use employee_id::generate_employee_id;
pub use navigation::Route;
pub use wizard::{
    SubmitOutcome, SubmitProgress, SubmitStage, WizardController, WizardError, WizardEvent,
    WizardSnapshot, WizardStep,
};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
