//! Employee listing: joins basic info with details and pages the result client-side.

use std::sync::Arc;

use anyhow::Result;
use shared::domain::{BasicInfo, Details, Employee, PLACEHOLDER};
use tracing::{error, info};

use crate::api::EmployeeApi;

pub const PAGE_SIZE: usize = 10;
pub const LISTING_FAILED_MESSAGE: &str = "Failed to load employees. Please try again.";

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

fn same_employee(email: &str, employee_id: &str, details: &Details) -> bool {
    details.email.as_deref() == Some(email) || details.employee_id.as_deref() == Some(employee_id)
}

/// Joins the two record sets by email or employee id, first match wins.
///
/// Every basic-info record yields one row in input order. Details that matched no row are
/// appended afterwards with placeholder identity fields.
pub fn merge_employees(basic_infos: &[BasicInfo], details: &[Details]) -> Vec<Employee> {
    let mut merged: Vec<Employee> = basic_infos
        .iter()
        .map(|basic| {
            let detail = details
                .iter()
                .find(|detail| same_employee(&basic.email, &basic.employee_id, detail));
            Employee {
                full_name: basic.full_name.clone(),
                email: basic.email.clone(),
                department: basic.department.clone(),
                role: basic.role.clone(),
                employee_id: basic.employee_id.clone(),
                photo: detail.map(|d| d.photo.clone()).unwrap_or_default(),
                employment_type: or_placeholder(
                    detail.map_or("", |d| d.employment_type.as_str()),
                    PLACEHOLDER,
                ),
                office_location: or_placeholder(
                    detail.map_or("", |d| d.office_location.as_str()),
                    PLACEHOLDER,
                ),
                notes: detail.map(|d| d.notes.clone()).unwrap_or_default(),
            }
        })
        .collect();

    for detail in details {
        let already_listed = merged
            .iter()
            .any(|row| same_employee(&row.email, &row.employee_id, detail));
        if already_listed {
            continue;
        }
        merged.push(Employee {
            full_name: PLACEHOLDER.to_string(),
            email: or_placeholder(detail.email.as_deref().unwrap_or_default(), PLACEHOLDER),
            department: PLACEHOLDER.to_string(),
            role: PLACEHOLDER.to_string(),
            employee_id: or_placeholder(
                detail.employee_id.as_deref().unwrap_or_default(),
                PLACEHOLDER,
            ),
            photo: detail.photo.clone(),
            employment_type: detail.employment_type.clone(),
            office_location: detail.office_location.clone(),
            notes: detail.notes.clone(),
        });
    }

    merged
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slices `items[(page - 1) * page_size ..][..page_size]`. Pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = items.len();
    let start = (page - 1).saturating_mul(page_size).min(total_items);
    let end = start.saturating_add(page_size).min(total_items);
    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_items,
        total_pages: total_items.div_ceil(page_size),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingView {
    Loading,
    Loaded(Page<Employee>),
    Failed(String),
}

pub struct EmployeeDirectory {
    api: Arc<dyn EmployeeApi>,
    page_size: usize,
}

impl EmployeeDirectory {
    pub fn new(api: Arc<dyn EmployeeApi>) -> Self {
        Self::with_page_size(api, PAGE_SIZE)
    }

    pub fn with_page_size(api: Arc<dyn EmployeeApi>, page_size: usize) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetches both record sets concurrently; either failing fails the whole load.
    pub async fn load_all(&self) -> Result<Vec<Employee>> {
        let (basic_infos, details) = tokio::try_join!(
            self.api.list_all_basic_info(),
            self.api.list_all_details()
        )?;
        let merged = merge_employees(&basic_infos, &details);
        info!(
            basic_infos = basic_infos.len(),
            details = details.len(),
            merged = merged.len(),
            "loaded employee directory"
        );
        Ok(merged)
    }

    pub async fn load_page(&self, page: usize) -> Result<Page<Employee>> {
        let employees = self.load_all().await?;
        Ok(paginate(&employees, page, self.page_size))
    }

    pub async fn view(&self, page: usize) -> ListingView {
        match self.load_page(page).await {
            Ok(page) => ListingView::Loaded(page),
            Err(error) => {
                error!(%error, "failed to fetch employees");
                ListingView::Failed(LISTING_FAILED_MESSAGE.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
