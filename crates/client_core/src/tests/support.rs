//! In-process stand-in for the registration backend.

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{BasicInfo, Department, Details, Location, Suggestion},
    protocol::PageQuery,
};
use storage::{KeyValueStore, MemoryStore};
use tokio::time::{sleep, Instant};

use crate::{api::EmployeeApi, debounce::lock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallRecord {
    pub operation: &'static str,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub basic_infos: Mutex<Vec<BasicInfo>>,
    pub details: Mutex<Vec<Details>>,
    pub departments: Vec<Suggestion>,
    pub locations: Vec<Suggestion>,
    pub write_latency: Duration,
    pub read_latency: Duration,
    /// Per-call latencies for `list_all_basic_info`, used before falling back to `read_latency`.
    pub basic_info_listing_latencies: Mutex<VecDeque<Duration>>,
    pub fail_basic_info_post: bool,
    pub fail_details_post: bool,
    pub fail_basic_info_listing: bool,
    pub fail_details_listing: bool,
    pub calls: Mutex<Vec<CallRecord>>,
}

impl FakeApi {
    pub fn with_records(basic_infos: Vec<BasicInfo>, details: Vec<Details>) -> Self {
        Self {
            basic_infos: Mutex::new(basic_infos),
            details: Mutex::new(details),
            ..Self::default()
        }
    }

    pub fn operations(&self) -> Vec<&'static str> {
        lock(&self.calls).iter().map(|call| call.operation).collect()
    }

    pub fn call(&self, operation: &str) -> Option<CallRecord> {
        lock(&self.calls)
            .iter()
            .find(|call| call.operation == operation)
            .cloned()
    }

    pub fn posted_basic_infos(&self) -> Vec<BasicInfo> {
        lock(&self.basic_infos).clone()
    }

    pub fn posted_details(&self) -> Vec<Details> {
        lock(&self.details).clone()
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        latency: Duration,
        work: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let started = Instant::now();
        if !latency.is_zero() {
            sleep(latency).await;
        }
        let outcome = work();
        lock(&self.calls).push(CallRecord {
            operation,
            started,
            finished: Instant::now(),
        });
        outcome
    }
}

fn filter_by_name(items: &[Suggestion], query: &str) -> Vec<Suggestion> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[async_trait]
impl EmployeeApi for FakeApi {
    async fn search_departments(&self, query: &str) -> Result<Vec<Department>> {
        self.timed("search_departments", self.read_latency, || {
            Ok(filter_by_name(&self.departments, query))
        })
        .await
    }

    async fn search_locations(&self, query: &str) -> Result<Vec<Location>> {
        self.timed("search_locations", self.read_latency, || {
            Ok(filter_by_name(&self.locations, query))
        })
        .await
    }

    async fn list_basic_info_page(&self, page: PageQuery) -> Result<Vec<BasicInfo>> {
        self.timed("list_basic_info_page", self.read_latency, || {
            let all = lock(&self.basic_infos).clone();
            let start = ((page.page.max(1) - 1) * page.limit) as usize;
            Ok(all
                .into_iter()
                .skip(start)
                .take(page.limit as usize)
                .collect())
        })
        .await
    }

    async fn list_all_basic_info(&self) -> Result<Vec<BasicInfo>> {
        let latency = lock(&self.basic_info_listing_latencies)
            .pop_front()
            .unwrap_or(self.read_latency);
        self.timed("list_all_basic_info", latency, || {
            if self.fail_basic_info_listing {
                return Err(anyhow!("failed to fetch all basic info: connection refused"));
            }
            Ok(lock(&self.basic_infos).clone())
        })
        .await
    }

    async fn create_basic_info(&self, info: &BasicInfo) -> Result<BasicInfo> {
        self.timed("create_basic_info", self.write_latency, || {
            if self.fail_basic_info_post {
                return Err(anyhow!("failed to post basic info: server responded with 500"));
            }
            lock(&self.basic_infos).push(info.clone());
            Ok(info.clone())
        })
        .await
    }

    async fn list_details_page(&self, page: PageQuery) -> Result<Vec<Details>> {
        self.timed("list_details_page", self.read_latency, || {
            let all = lock(&self.details).clone();
            let start = ((page.page.max(1) - 1) * page.limit) as usize;
            Ok(all
                .into_iter()
                .skip(start)
                .take(page.limit as usize)
                .collect())
        })
        .await
    }

    async fn list_all_details(&self) -> Result<Vec<Details>> {
        self.timed("list_all_details", self.read_latency, || {
            if self.fail_details_listing {
                return Err(anyhow!("failed to fetch all details: connection refused"));
            }
            Ok(lock(&self.details).clone())
        })
        .await
    }

    async fn create_details(&self, details: &Details) -> Result<Details> {
        self.timed("create_details", self.write_latency, || {
            if self.fail_details_post {
                return Err(anyhow!("failed to post details: server responded with 503"));
            }
            lock(&self.details).push(details.clone());
            Ok(details.clone())
        })
        .await
    }
}

pub(crate) fn basic_info(full_name: &str, email: &str, employee_id: &str) -> BasicInfo {
    BasicInfo {
        full_name: full_name.into(),
        email: email.into(),
        department: "Engineering".into(),
        role: "Engineer".into(),
        employee_id: employee_id.into(),
    }
}

pub(crate) fn details(email: Option<&str>, employee_id: Option<&str>, location: &str) -> Details {
    Details {
        photo: "data:image/png;base64,AA==".into(),
        employment_type: "Full-time".into(),
        office_location: location.into(),
        notes: String::new(),
        email: email.map(str::to_string),
        employee_id: employee_id.map(str::to_string),
    }
}

/// Draft backend whose writes take `put_latency` to land.
pub(crate) struct SlowStore {
    inner: MemoryStore,
    put_latency: Duration,
}

impl SlowStore {
    pub fn new(put_latency: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            put_latency,
        }
    }
}

#[async_trait]
impl KeyValueStore for SlowStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sleep(self.put_latency).await;
        self.inner.put(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}
