use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    wizard::email_message, AutocompleteField, DepartmentSuggestions, EmployeeApi,
    EmployeeDirectory, HttpEmployeeApi, ListingView, LocationSuggestions, Page, Route,
    SuggestionSource, WizardController, WizardError, WizardEvent,
};
use shared::{
    domain::{BasicInfoForm, DetailsForm, Employee, Role},
    error::FieldError,
};
use storage::{DraftStore, SqliteStore};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod photo;

use config::{load_settings, normalize_database_url, Settings};

#[derive(Parser, Debug)]
#[command(name = "registrar", about = "Register employees and browse the directory")]
struct Cli {
    /// Base URL serving basic info and departments.
    #[arg(long)]
    api_url: Option<String>,
    /// Base URL serving details and locations.
    #[arg(long)]
    details_api_url: Option<String>,
    #[arg(long)]
    draft_database_url: Option<String>,
    #[arg(long)]
    page_size: Option<usize>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill in the wizard and submit it. Missing values come from the saved draft.
    Register(RegisterArgs),
    /// Show one page of the merged employee listing.
    Employees {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
    /// Resolve an in-app path such as `/wizard?role=ops` or `/employees?page=2`.
    Open { path: String },
}

#[derive(Subcommand, Debug)]
enum DraftAction {
    Show {
        #[arg(long, default_value = "admin")]
        role: Role,
    },
    Clear {
        #[arg(long, default_value = "admin")]
        role: Role,
    },
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long, default_value = "admin")]
    role: Role,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Department search text; the best matching suggestion is used.
    #[arg(long)]
    department: Option<String>,
    /// Job title stored as the employee's role.
    #[arg(long)]
    job_title: Option<String>,
    #[arg(long)]
    employment_type: Option<String>,
    /// Office location search text; the best matching suggestion is used.
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    photo: Option<PathBuf>,
    #[arg(long)]
    notes: Option<String>,
}

impl RegisterArgs {
    /// Step 1 flags passed for a role that never sees step 1.
    fn unused_step_one_flags(&self) -> Vec<&'static str> {
        if self.role.sees_basic_info() {
            return Vec::new();
        }
        [
            ("--full-name", self.full_name.is_some()),
            ("--email", self.email.is_some()),
            ("--department", self.department.is_some()),
            ("--job-title", self.job_title.is_some()),
        ]
        .into_iter()
        .filter(|(_, given)| *given)
        .map(|(flag, _)| flag)
        .collect()
    }
}

struct AppContext {
    settings: Settings,
    api: Arc<dyn EmployeeApi>,
    drafts: DraftStore,
}

impl AppContext {
    async fn new(settings: Settings) -> Result<Self> {
        let database_url = normalize_database_url(&settings.draft_database_url);
        let store = SqliteStore::open(&database_url).await.map_err(|error| {
            error!(
                %database_url,
                %error,
                "failed to open draft database; verify the path and permissions"
            );
            error
        })?;
        store.health_check().await?;
        let api = HttpEmployeeApi::with_endpoints(
            settings.api_url.clone(),
            settings.details_api_url().to_string(),
        );
        Ok(Self {
            settings,
            api: Arc::new(api),
            drafts: DraftStore::new(Arc::new(store)),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(v) = cli.api_url {
        settings.api_url = v;
    }
    if let Some(v) = cli.details_api_url {
        settings.details_api_url = Some(v);
    }
    if let Some(v) = cli.draft_database_url {
        settings.draft_database_url = v;
    }
    if let Some(v) = cli.page_size {
        settings.page_size = v;
    }

    let ctx = AppContext::new(settings).await?;
    match cli.command {
        Command::Register(args) => register(&ctx, args).await,
        Command::Employees { page } => show_listing(&ctx, page).await,
        Command::Draft {
            action: DraftAction::Show { role },
        } => show_draft(&ctx, role).await,
        Command::Draft {
            action: DraftAction::Clear { role },
        } => {
            ctx.drafts.clear(role).await?;
            println!("cleared draft for {role}");
            Ok(())
        }
        Command::Open { path } => follow(&ctx, Route::parse(&path)).await,
    }
}

async fn register(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    let unused = args.unused_step_one_flags();
    if !unused.is_empty() {
        bail!(
            "{} only apply to the admin role; {} starts at step 2",
            unused.join(", "),
            args.role
        );
    }

    let RegisterArgs {
        role,
        full_name,
        email,
        department,
        job_title,
        employment_type,
        location,
        photo: photo_path,
        notes,
    } = args;

    let wizard = WizardController::open_with_autosave_delay(
        role,
        Arc::clone(&ctx.api),
        ctx.drafts.clone(),
        ctx.settings.autosave_delay(),
    )
    .await;
    let mut events = wizard.subscribe_events();
    let restored = wizard.snapshot();
    if restored.basic_info != BasicInfoForm::default() || restored.details != DetailsForm::default() {
        println!("restored saved draft for {role}");
    }

    if role.sees_basic_info() {
        wizard.update_basic_info(|info| {
            if let Some(v) = full_name {
                info.full_name = Some(v);
            }
            if let Some(v) = email {
                info.email = Some(v);
            }
            if let Some(v) = job_title {
                info.role = Some(v);
            }
        })?;
        if let Some(query) = department {
            let source = Arc::new(DepartmentSuggestions(Arc::clone(&ctx.api)));
            let name = pick_suggestion(source, &query, ctx.settings.search_debounce()).await;
            wizard.set_department(name).await?;
        }
        if let Some(message) = email_message(&wizard.snapshot().basic_info) {
            println!("{}: {}", message.field, message.message);
        }
        if let Err(error) = wizard.next() {
            return stop(&wizard, error).await;
        }
        println!("step 1 of 2 complete");
    }

    if let Some(path) = photo_path {
        match photo::load_photo(&path).await {
            Ok(data_url) => wizard.update_details(|details| details.photo = Some(data_url)),
            Err(error) => {
                println!("{error}");
                wizard.flush_draft().await?;
                return Err(error);
            }
        }
    }
    let office_location = match location {
        Some(query) => {
            let source = Arc::new(LocationSuggestions(Arc::clone(&ctx.api)));
            Some(pick_suggestion(source, &query, ctx.settings.search_debounce()).await)
        }
        None => None,
    };
    wizard.update_details(|details| {
        if let Some(v) = office_location {
            details.office_location = Some(v);
        }
        if let Some(v) = employment_type {
            details.employment_type = Some(v);
        }
        if let Some(v) = notes {
            details.notes = Some(v);
        }
    });

    let result = wizard.submit().await;
    print_events(&mut events);
    match result {
        Ok(outcome) => {
            info!(%role, redirect = %outcome.redirect, "registration submitted");
            println!("submitted; opening {}", outcome.redirect);
            follow(ctx, outcome.redirect).await
        }
        Err(error @ WizardError::SubmitFailed { .. }) => {
            println!("{}", error.user_message());
            Err(error.into())
        }
        Err(error) => stop(&wizard, error).await,
    }
}

/// Keeps whatever was entered and reports why the wizard cannot go on.
async fn stop(wizard: &WizardController, error: WizardError) -> Result<()> {
    if let Err(save_error) = wizard.flush_draft().await {
        warn!(error = %save_error, "failed to save draft before exiting");
    } else {
        println!("draft saved for {}", wizard.role());
    }
    if let WizardError::Incomplete(errors) = &error {
        print_field_errors(errors);
    }
    Err(error.into())
}

fn print_field_errors(errors: &[FieldError]) {
    for error in errors {
        println!("  - {}: {}", error.field, error.message);
    }
}

fn print_events(events: &mut broadcast::Receiver<WizardEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            WizardEvent::Submit(progress) => {
                println!("[{:>3}%] {}", progress.percent(), progress.message())
            }
            WizardEvent::StepChanged(step) => println!("moved to step {}", step.number()),
            WizardEvent::DraftSaved => println!("draft saved"),
            WizardEvent::DraftRestored => println!("draft restored"),
            WizardEvent::DraftCleared => println!("draft cleared"),
        }
    }
}

/// Runs one search for `query` and takes the exact match, else the first suggestion, else
/// the typed text.
async fn pick_suggestion(source: Arc<dyn SuggestionSource>, query: &str, delay: Duration) -> String {
    let field = AutocompleteField::with_delay(source, delay);
    field.set_value(query);
    let snapshot = field.search_now().await;
    let chosen = snapshot
        .suggestions
        .iter()
        .find(|suggestion| suggestion.name.eq_ignore_ascii_case(query))
        .or_else(|| snapshot.suggestions.first())
        .cloned();

    match chosen {
        Some(suggestion) => {
            field.select(&suggestion);
            info!(query, choice = %suggestion.name, "picked suggestion");
            suggestion.name
        }
        None => {
            warn!(query, "no suggestion matched; keeping typed value");
            query.to_string()
        }
    }
}

async fn follow(ctx: &AppContext, route: Route) -> Result<()> {
    match route {
        Route::RoleSelection => {
            println!("choose a role:");
            for role in [Role::Admin, Role::Ops] {
                println!("  {}", Route::Wizard { role });
            }
            println!("or browse {}", Route::employees());
            Ok(())
        }
        Route::Wizard { role } => show_draft(ctx, role).await,
        Route::Employees { page } => show_listing(ctx, page).await,
        Route::NotFound { path } => Err(anyhow!("404: nothing lives at '{path}'")),
    }
}

async fn show_draft(ctx: &AppContext, role: Role) -> Result<()> {
    match ctx.drafts.load(role).await {
        Some(draft) => println!("{}", serde_json::to_string_pretty(&draft)?),
        None => println!("no draft saved for {role}"),
    }
    Ok(())
}

async fn show_listing(ctx: &AppContext, page: usize) -> Result<()> {
    let directory = EmployeeDirectory::with_page_size(Arc::clone(&ctx.api), ctx.settings.page_size);
    match directory.view(page).await {
        ListingView::Loaded(page) => {
            print_page(&page);
            Ok(())
        }
        ListingView::Failed(message) => bail!(message),
        ListingView::Loading => Ok(()),
    }
}

fn print_page(page: &Page<Employee>) {
    println!(
        "{:<24} {:<28} {:<16} {:<16} {:<10} {:<12} {:<16} {:<5} Notes",
        "Name", "Email", "Department", "Role", "ID", "Type", "Location", "Photo"
    );
    for employee in &page.items {
        println!(
            "{:<24} {:<28} {:<16} {:<16} {:<10} {:<12} {:<16} {:<5} {}",
            employee.full_name,
            employee.email,
            employee.department,
            employee.role,
            employee.employee_id,
            employee.employment_type,
            employee.office_location,
            if employee.photo.is_empty() { "no" } else { "yes" },
            employee.notes,
        );
    }
    if page.items.is_empty() {
        println!("no employees on this page");
    }

    println!(
        "page {} of {} ({} employees)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
    if page.has_previous() {
        println!("previous: {}", Route::Employees { page: page.page - 1 });
    }
    if page.has_next() {
        println!("next: {}", Route::Employees { page: page.page + 1 });
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
