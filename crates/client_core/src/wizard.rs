//! Two-step registration wizard: step gating, draft auto-save and the sequential submit.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, LazyLock, Mutex,
    },
    time::Duration,
};

use regex::Regex;
use shared::{
    domain::{BasicInfo, BasicInfoForm, Details, DetailsForm, DraftData, Role},
    error::{FieldError, FormField},
};
use storage::DraftStore;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tracing::{debug, error, info, warn};

use crate::{
    api::EmployeeApi,
    debounce::{lock, Debouncer},
    employee_id::generate_employee_id,
    navigation::Route,
};

pub const AUTOSAVE_DELAY: Duration = Duration::from_secs(2);
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit form. Please try again.";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Inline message for the email input. Nothing is shown while the input is empty.
pub fn email_message(form: &BasicInfoForm) -> Option<FieldError> {
    match form.email.as_deref() {
        Some(email) if !email.is_empty() && !is_valid_email(email) => {
            Some(FieldError::new(FormField::Email, INVALID_EMAIL_MESSAGE))
        }
        _ => None,
    }
}

pub fn validate_basic_info(form: &BasicInfoForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if is_blank(&form.full_name) {
        errors.push(FieldError::required(FormField::FullName));
    }
    if is_blank(&form.email) {
        errors.push(FieldError::required(FormField::Email));
    } else if let Some(message) = email_message(form) {
        errors.push(message);
    }
    if is_blank(&form.department) {
        errors.push(FieldError::required(FormField::Department));
    }
    if is_blank(&form.role) {
        errors.push(FieldError::required(FormField::Role));
    }
    if is_blank(&form.employee_id) {
        errors.push(FieldError::required(FormField::EmployeeId));
    }
    errors
}

pub fn validate_details(form: &DetailsForm) -> Vec<FieldError> {
    [
        (FormField::Photo, &form.photo),
        (FormField::EmploymentType, &form.employment_type),
        (FormField::OfficeLocation, &form.office_location),
    ]
    .into_iter()
    .filter(|(_, value)| is_blank(value))
    .map(|(field, _)| FieldError::required(field))
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    BasicInfo,
    Details,
}

impl WizardStep {
    pub fn first_for(role: Role) -> Self {
        if role.sees_basic_info() {
            WizardStep::BasicInfo
        } else {
            WizardStep::Details
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            WizardStep::BasicInfo => 1,
            WizardStep::Details => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStage {
    BasicInfo,
    Details,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitProgress {
    SubmittingBasicInfo,
    BasicInfoSaved,
    SubmittingDetails,
    DetailsSaved,
    Completed,
    Failed(String),
}

impl SubmitProgress {
    /// Rough completion percentage for a progress bar.
    pub fn percent(&self) -> u8 {
        match self {
            SubmitProgress::SubmittingBasicInfo => 10,
            SubmitProgress::BasicInfoSaved => 50,
            SubmitProgress::SubmittingDetails => 60,
            SubmitProgress::DetailsSaved => 90,
            SubmitProgress::Completed => 100,
            SubmitProgress::Failed(_) => 0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SubmitProgress::SubmittingBasicInfo => "Submitting basic info...",
            SubmitProgress::BasicInfoSaved => "Basic info saved",
            SubmitProgress::SubmittingDetails => "Submitting details...",
            SubmitProgress::DetailsSaved => "Details saved",
            SubmitProgress::Completed => "All data processed successfully",
            SubmitProgress::Failed(message) => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    StepChanged(WizardStep),
    DraftRestored,
    DraftSaved,
    DraftCleared,
    Submit(SubmitProgress),
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("the {role} role has no {step:?} step")]
    StepUnavailable { role: Role, step: WizardStep },
    #[error("expected to be on the {expected:?} step, currently on {actual:?}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },
    #[error("form is incomplete: {}", describe(.0))]
    Incomplete(Vec<FieldError>),
    #[error("a submission is already in progress")]
    AlreadySubmitting,
    #[error("Failed to submit form. Please try again.")]
    SubmitFailed {
        stage: SubmitStage,
        source: anyhow::Error,
    },
}

impl WizardError {
    /// Text suitable for showing to the person filling in the form.
    pub fn user_message(&self) -> String {
        match self {
            WizardError::SubmitFailed { .. } => SUBMIT_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSnapshot {
    pub role: Role,
    pub step: WizardStep,
    pub basic_info: BasicInfoForm,
    pub details: DetailsForm,
    pub submitting: bool,
}

impl WizardSnapshot {
    pub fn basic_info_errors(&self) -> Vec<FieldError> {
        validate_basic_info(&self.basic_info)
    }

    pub fn details_errors(&self) -> Vec<FieldError> {
        validate_details(&self.details)
    }

    /// Whether "Next" is enabled.
    pub fn can_advance(&self) -> bool {
        self.step == WizardStep::BasicInfo && self.basic_info_errors().is_empty()
    }

    /// Whether "Submit" is enabled.
    pub fn can_submit(&self) -> bool {
        self.step == WizardStep::Details && !self.submitting && self.details_errors().is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.role.sees_basic_info() && self.step == WizardStep::Details && !self.submitting
    }

    fn draft(&self) -> DraftData {
        DraftData {
            basic_info: self
                .role
                .sees_basic_info()
                .then(|| self.basic_info.clone()),
            details: Some(self.details.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub basic_info: Option<BasicInfo>,
    pub details: Details,
    pub redirect: Route,
}

/// Serialises draft writes for one role.
///
/// Every clear bumps the epoch while holding the write fence, so a write still in flight
/// finishes first and a write scheduled before the clear is dropped.
#[derive(Clone)]
struct DraftWriter {
    role: Role,
    drafts: DraftStore,
    epoch: Arc<AtomicU64>,
    fence: Arc<AsyncMutex<()>>,
}

impl DraftWriter {
    fn new(role: Role, drafts: DraftStore) -> Self {
        Self {
            role,
            drafts,
            epoch: Arc::new(AtomicU64::new(0)),
            fence: Arc::new(AsyncMutex::new(())),
        }
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Returns `false` when the draft was cleared after `epoch` was read.
    async fn save(&self, epoch: u64, draft: &DraftData) -> anyhow::Result<bool> {
        let _fence = self.fence.lock().await;
        if self.epoch() != epoch {
            return Ok(false);
        }
        self.drafts.save(self.role, draft).await?;
        Ok(true)
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let _fence = self.fence.lock().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.drafts.clear(self.role).await
    }
}

/// Owns the in-memory form state for one role and everything that happens to it.
///
/// Form edits re-arm a quiet-period timer that writes the draft; submit writes basic info
/// (admin only) and then details, strictly one after the other.
pub struct WizardController {
    role: Role,
    api: Arc<dyn EmployeeApi>,
    drafts: DraftWriter,
    state: Mutex<WizardSnapshot>,
    autosave: Debouncer<(u64, DraftData)>,
    events: broadcast::Sender<WizardEvent>,
}

impl WizardController {
    /// Opens the wizard for `role`, restoring that role's saved draft if one exists.
    pub async fn open(role: Role, api: Arc<dyn EmployeeApi>, drafts: DraftStore) -> Self {
        Self::open_with_autosave_delay(role, api, drafts, AUTOSAVE_DELAY).await
    }

    pub async fn open_with_autosave_delay(
        role: Role,
        api: Arc<dyn EmployeeApi>,
        drafts: DraftStore,
        autosave_delay: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let writer = DraftWriter::new(role, drafts.clone());
        let autosave = {
            let writer = writer.clone();
            let events = events.clone();
            Debouncer::new(autosave_delay, move |(epoch, draft): (u64, DraftData)| {
                let writer = writer.clone();
                let events = events.clone();
                async move {
                    match writer.save(epoch, &draft).await {
                        Ok(true) => {
                            let _ = events.send(WizardEvent::DraftSaved);
                        }
                        Ok(false) => debug!(%role, "dropped auto-save scheduled before a clear"),
                        Err(error) => warn!(%role, %error, "failed to auto-save draft"),
                    }
                }
            })
        };

        let mut snapshot = WizardSnapshot {
            role,
            step: WizardStep::first_for(role),
            basic_info: BasicInfoForm::default(),
            details: DetailsForm::default(),
            submitting: false,
        };
        let restored = match drafts.load(role).await {
            Some(draft) => {
                if let Some(basic_info) = draft.basic_info {
                    snapshot.basic_info = basic_info;
                }
                if let Some(details) = draft.details {
                    snapshot.details = details;
                }
                info!(%role, "restored wizard draft");
                true
            }
            None => false,
        };

        let controller = Self {
            role,
            api,
            drafts: writer,
            state: Mutex::new(snapshot),
            autosave,
            events,
        };
        if restored {
            controller.emit(WizardEvent::DraftRestored);
        }
        controller
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        lock(&self.state).clone()
    }

    pub fn step(&self) -> WizardStep {
        lock(&self.state).step
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WizardEvent> {
        self.events.subscribe()
    }

    pub fn is_autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    fn emit(&self, event: WizardEvent) {
        let _ = self.events.send(event);
    }

    fn schedule_autosave(&self, snapshot: &WizardSnapshot) {
        self.autosave.call((self.drafts.epoch(), snapshot.draft()));
    }

    /// Edits the step 1 form. Admin only.
    pub fn update_basic_info(
        &self,
        edit: impl FnOnce(&mut BasicInfoForm),
    ) -> Result<(), WizardError> {
        if !self.role.sees_basic_info() {
            return Err(WizardError::StepUnavailable {
                role: self.role,
                step: WizardStep::BasicInfo,
            });
        }
        let mut state = lock(&self.state);
        edit(&mut state.basic_info);
        self.schedule_autosave(&state);
        Ok(())
    }

    pub fn update_details(&self, edit: impl FnOnce(&mut DetailsForm)) {
        let mut state = lock(&self.state);
        edit(&mut state.details);
        self.schedule_autosave(&state);
    }

    /// Sets the department and derives a fresh employee id from the current employee list.
    ///
    /// If the list cannot be fetched the previous id is kept. A result for a department that
    /// has since been changed again is dropped.
    pub async fn set_department(&self, department: impl Into<String>) -> Result<(), WizardError> {
        let department = department.into();
        self.update_basic_info(|info| info.department = Some(department.clone()))?;

        let existing = match self.api.list_all_basic_info().await {
            Ok(existing) => existing,
            Err(error) => {
                error!(%department, %error, "failed to generate employee id");
                return Ok(());
            }
        };
        let employee_id = generate_employee_id(&department, &existing);
        debug!(%department, %employee_id, "generated employee id");
        self.update_basic_info(|info| {
            if info.department.as_deref() == Some(department.as_str()) {
                info.employee_id = Some(employee_id);
            }
        })
    }

    /// Moves from step 1 to step 2 once step 1 is valid.
    pub fn next(&self) -> Result<(), WizardError> {
        if !self.role.sees_basic_info() {
            return Err(WizardError::StepUnavailable {
                role: self.role,
                step: WizardStep::BasicInfo,
            });
        }
        let mut state = lock(&self.state);
        if state.step != WizardStep::BasicInfo {
            return Err(WizardError::WrongStep {
                expected: WizardStep::BasicInfo,
                actual: state.step,
            });
        }
        let errors = state.basic_info_errors();
        if !errors.is_empty() {
            return Err(WizardError::Incomplete(errors));
        }
        state.step = WizardStep::Details;
        // Replaces any pending write with one carrying the state as of the step change.
        self.schedule_autosave(&state);
        drop(state);
        self.emit(WizardEvent::StepChanged(WizardStep::Details));
        Ok(())
    }

    /// Returns to step 1 keeping both forms. Admin only, and not while submitting.
    pub fn back(&self) -> Result<(), WizardError> {
        if !self.role.sees_basic_info() {
            return Err(WizardError::StepUnavailable {
                role: self.role,
                step: WizardStep::BasicInfo,
            });
        }
        let mut state = lock(&self.state);
        if state.submitting {
            return Err(WizardError::AlreadySubmitting);
        }
        if state.step != WizardStep::Details {
            return Err(WizardError::WrongStep {
                expected: WizardStep::Details,
                actual: state.step,
            });
        }
        state.step = WizardStep::BasicInfo;
        self.schedule_autosave(&state);
        drop(state);
        self.emit(WizardEvent::StepChanged(WizardStep::BasicInfo));
        Ok(())
    }

    /// Writes basic info (admin) and then details, each awaited before the next starts.
    ///
    /// On success the role's draft is cleared and the listing route is returned. On failure
    /// the draft is left in place so the user can retry.
    pub async fn submit(&self) -> Result<SubmitOutcome, WizardError> {
        let (basic_info, details) = {
            let mut state = lock(&self.state);
            if state.step != WizardStep::Details {
                return Err(WizardError::WrongStep {
                    expected: WizardStep::Details,
                    actual: state.step,
                });
            }
            if state.submitting {
                return Err(WizardError::AlreadySubmitting);
            }
            let basic_info = if self.role.sees_basic_info() {
                let record = state.basic_info.to_record();
                match record {
                    Some(record) if is_valid_email(&record.email) => Some(record),
                    _ => return Err(WizardError::Incomplete(state.basic_info_errors())),
                }
            } else {
                None
            };
            let identity = self.role.sees_basic_info().then_some(&state.basic_info);
            let Some(details) = state.details.to_record(identity) else {
                return Err(WizardError::Incomplete(state.details_errors()));
            };
            state.submitting = true;
            (basic_info, details)
        };
        self.autosave.cancel();

        let result = self.write_records(basic_info.as_ref(), &details).await;

        let snapshot = {
            let mut state = lock(&self.state);
            state.submitting = false;
            state.clone()
        };

        match result {
            Ok(()) => {
                // Edits made while the writes were in flight must not bring the draft back.
                self.autosave.cancel();
                if let Err(error) = self.drafts.clear().await {
                    warn!(role = %self.role, %error, "submitted but failed to clear draft");
                }
                info!(role = %self.role, "all data processed successfully");
                self.emit(WizardEvent::Submit(SubmitProgress::Completed));
                Ok(SubmitOutcome {
                    basic_info,
                    details,
                    redirect: Route::employees(),
                })
            }
            Err(err) => {
                error!(role = %self.role, error = %err, "submission failed");
                self.emit(WizardEvent::Submit(SubmitProgress::Failed(
                    SUBMIT_FAILED_MESSAGE.to_string(),
                )));
                // Keep the stored draft in step with edits made before the attempt.
                self.schedule_autosave(&snapshot);
                Err(err)
            }
        }
    }

    async fn write_records(
        &self,
        basic_info: Option<&BasicInfo>,
        details: &Details,
    ) -> Result<(), WizardError> {
        if let Some(basic_info) = basic_info {
            info!(employee_id = %basic_info.employee_id, "submitting basic info");
            self.emit(WizardEvent::Submit(SubmitProgress::SubmittingBasicInfo));
            self.api
                .create_basic_info(basic_info)
                .await
                .map_err(|source| WizardError::SubmitFailed {
                    stage: SubmitStage::BasicInfo,
                    source,
                })?;
            info!("basic info saved");
            self.emit(WizardEvent::Submit(SubmitProgress::BasicInfoSaved));
        }

        info!("submitting details");
        self.emit(WizardEvent::Submit(SubmitProgress::SubmittingDetails));
        self.api
            .create_details(details)
            .await
            .map_err(|source| WizardError::SubmitFailed {
                stage: SubmitStage::Details,
                source,
            })?;
        info!("details saved");
        self.emit(WizardEvent::Submit(SubmitProgress::DetailsSaved));
        Ok(())
    }

    /// Writes the current draft right away instead of waiting for the quiet period.
    pub async fn flush_draft(&self) -> anyhow::Result<()> {
        self.autosave.cancel();
        let draft = lock(&self.state).draft();
        if self.drafts.save(self.drafts.epoch(), &draft).await? {
            self.emit(WizardEvent::DraftSaved);
        }
        Ok(())
    }

    /// Drops the stored draft and empties both forms.
    pub async fn clear_draft(&self) -> anyhow::Result<()> {
        self.autosave.cancel();
        self.drafts.clear().await?;
        {
            let mut state = lock(&self.state);
            state.basic_info = BasicInfoForm::default();
            state.details = DetailsForm::default();
        }
        self.emit(WizardEvent::DraftCleared);
        Ok(())
    }

    /// Cancels any pending auto-save. Call when the wizard view goes away.
    pub fn close(&self) {
        if self.autosave.cancel() {
            debug!(role = %self.role, "discarded pending auto-save on close");
        }
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
