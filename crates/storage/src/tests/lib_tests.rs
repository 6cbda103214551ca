use super::*;
use shared::domain::{BasicInfoForm, DetailsForm};

fn sample_draft() -> DraftData {
    DraftData {
        basic_info: Some(BasicInfoForm {
            full_name: Some("John Doe".into()),
            email: Some("john@example.com".into()),
            department: Some("Engineering".into()),
            role: None,
            employee_id: Some("ENG-001".into()),
        }),
        details: Some(DetailsForm {
            office_location: Some("Jakarta".into()),
            notes: Some("prefers mornings".into()),
            ..DetailsForm::default()
        }),
    }
}

#[tokio::test]
async fn draft_round_trips_through_memory_store() {
    let drafts = DraftStore::in_memory();
    let draft = sample_draft();

    drafts.save(Role::Admin, &draft).await.expect("save");

    assert_eq!(drafts.load(Role::Admin).await, Some(draft));
}

#[tokio::test]
async fn drafts_are_scoped_per_role() {
    let drafts = DraftStore::in_memory();
    drafts
        .save(Role::Admin, &sample_draft())
        .await
        .expect("save");

    assert_eq!(drafts.load(Role::Ops).await, None);
}

#[tokio::test]
async fn save_overwrites_previous_draft() {
    let drafts = DraftStore::in_memory();
    drafts
        .save(Role::Ops, &sample_draft())
        .await
        .expect("first save");
    let replacement = DraftData {
        basic_info: None,
        details: Some(DetailsForm {
            employment_type: Some("Intern".into()),
            ..DetailsForm::default()
        }),
    };
    drafts.save(Role::Ops, &replacement).await.expect("second save");

    assert_eq!(drafts.load(Role::Ops).await, Some(replacement));
}

#[tokio::test]
async fn clear_then_load_returns_none() {
    let drafts = DraftStore::in_memory();
    drafts
        .save(Role::Admin, &sample_draft())
        .await
        .expect("save");

    drafts.clear(Role::Admin).await.expect("clear");

    assert_eq!(drafts.load(Role::Admin).await, None);
}

#[tokio::test]
async fn clearing_missing_draft_is_a_no_op() {
    let drafts = DraftStore::in_memory();
    drafts.clear(Role::Ops).await.expect("clear missing");
    assert_eq!(drafts.load(Role::Ops).await, None);
}

#[tokio::test]
async fn unreadable_draft_loads_as_none() {
    let store = Arc::new(MemoryStore::new());
    store
        .put(&DraftStore::key_for(Role::Admin), "{not json")
        .await
        .expect("put");
    let drafts = DraftStore::new(store);

    assert_eq!(drafts.load(Role::Admin).await, None);
}

#[tokio::test]
async fn draft_with_incompatible_field_type_loads_as_none() {
    let store = Arc::new(MemoryStore::new());
    store
        .put(
            &DraftStore::key_for(Role::Ops),
            r#"{"details":{"photo":42}}"#,
        )
        .await
        .expect("put");
    let drafts = DraftStore::new(store);

    assert_eq!(drafts.load(Role::Ops).await, None);
}

struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(anyhow::anyhow!("storage unavailable"))
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<()> {
        Err(anyhow::anyhow!("quota exceeded"))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(anyhow::anyhow!("storage unavailable"))
    }
}

#[tokio::test]
async fn failing_medium_loads_as_none_and_reports_writes() {
    let drafts = DraftStore::new(Arc::new(FailingStore));

    assert_eq!(drafts.load(Role::Admin).await, None);
    let err = drafts
        .save(Role::Admin, &sample_draft())
        .await
        .expect_err("save must fail");
    assert!(err.to_string().contains("quota exceeded"));
}

#[test]
fn draft_keys_are_prefixed_by_role() {
    assert_eq!(DraftStore::key_for(Role::Admin), "draft_admin");
    assert_eq!(DraftStore::key_for(Role::Ops), "draft_ops");
}

#[tokio::test]
async fn sqlite_store_puts_overwrites_and_removes() {
    let store = SqliteStore::open("sqlite::memory:").await.expect("db");
    store.health_check().await.expect("health check");

    store.put("k", "one").await.expect("put");
    store.put("k", "two").await.expect("overwrite");
    assert_eq!(store.get("k").await.expect("get"), Some("two".to_string()));

    store.remove("k").await.expect("remove");
    assert_eq!(store.get("k").await.expect("get"), None);
}

#[tokio::test]
async fn draft_round_trips_through_sqlite_store() {
    let store = SqliteStore::open("sqlite::memory:").await.expect("db");
    let drafts = DraftStore::new(Arc::new(store));
    let draft = sample_draft();

    drafts.save(Role::Admin, &draft).await.expect("save");

    assert_eq!(drafts.load(Role::Admin).await, Some(draft));
}

#[test]
fn sqlite_path_ignores_memory_and_non_sqlite_urls() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/drafts.db?mode=rwc"),
        Some(PathBuf::from("./data/drafts.db"))
    );
}
