use shared::domain::BasicInfo;

/// Derives the next `{CODE}-{seq}` id for `department`.
///
/// The code is the first three characters of the department, upper-cased; the sequence is
/// one past the number of existing ids that start with that code. Two callers working from
/// the same stale `existing` list will produce the same id.
pub fn generate_employee_id(department: &str, existing: &[BasicInfo]) -> String {
    let code = department.chars().take(3).collect::<String>().to_uppercase();
    let taken = existing
        .iter()
        .filter(|employee| employee.employee_id.starts_with(&code))
        .count();
    format!("{code}-{:03}", taken + 1)
}
