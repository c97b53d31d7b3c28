use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{Value, json};

use jobboard::config::ClientConfig;
use jobboard::error::{ApiError, AuthError, ValidationError};
use jobboard::net::api::JobBoardApi;
use jobboard::net::types::{
    ApplicationStatus, ExperienceLevel, JobUpdate, ProfileUpdate, RegisterRequest, Role,
};
use jobboard::pages::ViewState;
use jobboard::pages::applications::ApplicationsView;
use jobboard::pages::create_job::{CreateJobView, salary_range};
use jobboard::pages::dashboard::EmployerDashboardView;
use jobboard::pages::job_detail::JobDetailView;
use jobboard::pages::jobs::JobListView;
use jobboard::pages::messages::MessagingView;
use jobboard::pages::notifications::NotificationsView;
use jobboard::pages::profile::ProfileView;
use jobboard::routes::LOGIN;
use jobboard::routes::guard::Decision;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path} is not available; redirected to {target}")]
    Redirected { path: String, target: String },
    #[error("{0}")]
    View(&'static str),
    #[error("request failed: {0}")]
    Api(#[from] ApiError),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "jobboard", about = "Job board client")]
struct Cli {
    #[arg(long, env = "JOBBOARD_API_URL")]
    base_url: Option<String>,

    #[arg(long, env = "JOBBOARD_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and log in as it.
    Register(RegisterArgs),
    Logout,
    /// Show the current session.
    Whoami,
    /// Show what the route guard decides for a path.
    Route { path: String },
    Jobs(JobsCommand),
    /// Apply to a job as a job seeker.
    Apply {
        job_id: String,
        #[arg(long, default_value = "")]
        cover_letter: String,
    },
    Applications(ApplicationsCommand),
    /// Employer dashboard: own jobs, incoming applications, totals.
    Dashboard,
    Messages(MessagesCommand),
    Notifications(NotificationsCommand),
    Profile(ProfileCommand),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    JobSeeker,
    Employer,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::JobSeeker => Self::JobSeeker,
            RoleArg::Employer => Self::Employer,
        }
    }
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long, value_enum, default_value = "job-seeker")]
    role: RoleArg,
    #[arg(long)]
    company_name: Option<String>,
}

#[derive(Args, Debug)]
struct JobsCommand {
    #[command(subcommand)]
    command: JobsSubcommand,
}

#[derive(Subcommand, Debug)]
enum JobsSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        remote: Option<bool>,
        #[arg(long)]
        experience_level: Option<ExperienceLevel>,
        #[arg(long, default_value = "")]
        salary_min: String,
    },
    Show {
        job_id: String,
    },
    Create(CreateJobArgs),
    Update {
        job_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        remote: Option<bool>,
        #[arg(long)]
        experience_level: Option<ExperienceLevel>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "requirement")]
        requirements: Vec<String>,
        #[arg(long, default_value = "")]
        salary_min: String,
        #[arg(long, default_value = "")]
        salary_max: String,
        #[arg(long)]
        deadline: Option<String>,
    },
    Delete {
        job_id: String,
    },
}

#[derive(Args, Debug)]
struct CreateJobArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    location: String,
    #[arg(long, default_value_t = false)]
    remote: bool,
    #[arg(long, default_value = "MID")]
    experience_level: ExperienceLevel,
    #[arg(long, default_value = "")]
    salary_min: String,
    #[arg(long, default_value = "")]
    salary_max: String,
    #[arg(long = "requirement")]
    requirements: Vec<String>,
    #[arg(long, default_value = "")]
    deadline: String,
}

#[derive(Args, Debug)]
struct ApplicationsCommand {
    #[command(subcommand)]
    command: ApplicationsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ApplicationsSubcommand {
    List {
        #[arg(long)]
        status: Option<ApplicationStatus>,
    },
    /// Move an application to a new status (employers).
    Status {
        application_id: String,
        status: ApplicationStatus,
    },
}

#[derive(Args, Debug)]
struct MessagesCommand {
    #[command(subcommand)]
    command: MessagesSubcommand,
}

#[derive(Subcommand, Debug)]
enum MessagesSubcommand {
    Conversations,
    Thread { user_id: String },
    Send { user_id: String, content: String },
}

#[derive(Args, Debug)]
struct NotificationsCommand {
    #[command(subcommand)]
    command: NotificationsSubcommand,
}

#[derive(Subcommand, Debug)]
enum NotificationsSubcommand {
    List,
    Read { notification_id: String },
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company_name: Option<String>,
    },
    UploadResume {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url.as_deref() {
        config.base_url = base_url.trim().trim_end_matches('/').to_owned();
    }
    if let Some(token_file) = cli.token_file {
        config.token_file = token_file;
    }

    let api = JobBoardApi::from_config(&config)?;
    api.session().restore_session().await;

    match cli.command {
        Command::Login { email, password } => {
            let user = api.session().login(&email, &password).await?;
            print_json(&user)
        }
        Command::Register(args) => run_register(&api, args).await,
        Command::Logout => {
            api.session().logout().await;
            eprintln!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let session = api.session().snapshot();
            print_json(&json!({ "status": session.status(), "user": session.user() }))
        }
        Command::Route { path } => {
            let decision = api.session().navigate(&path).await;
            print_json(&json!({
                "path": path,
                "decision": format!("{decision:?}"),
                "target": decision.target(&path),
            }))
        }
        Command::Jobs(jobs) => run_jobs(&api, jobs).await,
        Command::Apply { job_id, cover_letter } => run_apply(&api, &job_id, cover_letter).await,
        Command::Applications(apps) => run_applications(&api, apps).await,
        Command::Dashboard => run_dashboard(&api).await,
        Command::Messages(messages) => run_messages(&api, messages).await,
        Command::Notifications(notifications) => run_notifications(&api, notifications).await,
        Command::Profile(profile) => run_profile(&api, profile).await,
    }
}

/// Refuse to run a command whose view the guard would not open.
async fn guard(api: &JobBoardApi, path: &str) -> Result<(), CliError> {
    match api.session().navigate(path).await {
        Decision::Allow => Ok(()),
        decision => Err(CliError::Redirected { path: path.to_owned(), target: decision.target(path).to_owned() }),
    }
}

/// Turn a view's failure fields into a command error.
fn check(state: &ViewState, path: &str) -> Result<(), CliError> {
    match (state.error, state.redirect) {
        (Some(_), Some(LOGIN)) => Err(CliError::Redirected { path: path.to_owned(), target: LOGIN.to_owned() }),
        (Some(message), _) => Err(CliError::View(message)),
        (None, _) => Ok(()),
    }
}

async fn run_register(api: &JobBoardApi, args: RegisterArgs) -> Result<(), CliError> {
    let profile = RegisterRequest {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        password: args.password,
        role: args.role.into(),
        company_name: args.company_name,
    };
    let user = api.session().register(profile).await?;
    print_json(&user)
}

async fn run_jobs(api: &JobBoardApi, jobs: JobsCommand) -> Result<(), CliError> {
    match jobs.command {
        JobsSubcommand::List { search, location, remote, experience_level, salary_min } => {
            guard(api, "/jobs").await?;
            let mut view = JobListView::new(api.clone());
            view.set_salary_min(&salary_min)?;
            view.set_search(search.as_deref().unwrap_or_default());
            view.set_location(location.as_deref().unwrap_or_default());
            view.set_remote(remote);
            view.set_experience_level(experience_level);
            view.load().await;
            check(&view.state, "/jobs")?;
            let rows: Vec<Value> = view
                .rows()
                .into_iter()
                .map(|row| {
                    json!({
                        "id": row.id, "title": row.title, "company": row.company,
                        "location": row.location, "remote": row.remote, "salary": row.salary,
                    })
                })
                .collect();
            print_json(&rows)
        }
        JobsSubcommand::Show { job_id } => {
            let path = format!("/jobs/{job_id}");
            guard(api, &path).await?;
            let mut view = JobDetailView::new(api.clone(), &job_id);
            view.load().await;
            check(&view.state, &path)?;
            if view.not_found {
                return Err(CliError::Api(ApiError::NotFound));
            }
            print_json(&json!({ "job": view.job, "salary": view.salary() }))
        }
        JobsSubcommand::Create(args) => {
            guard(api, "/employer/jobs/create").await?;
            let mut view = CreateJobView::new(api.clone());
            view.form.title = args.title;
            view.form.description = args.description;
            view.form.location = args.location;
            view.form.remote = args.remote;
            view.form.experience_level = args.experience_level;
            view.form.salary_min = args.salary_min;
            view.form.salary_max = args.salary_max;
            view.form.application_deadline = args.deadline;
            for requirement in &args.requirements {
                view.form.add_requirement(requirement);
            }
            view.submit().await;
            if let Some(invalid) = view.invalid.take() {
                return Err(invalid.into());
            }
            check(&view.state, "/employer/jobs/create")?;
            print_json(&view.created)
        }
        JobsSubcommand::Update {
            job_id,
            title,
            description,
            location,
            remote,
            experience_level,
            status,
            requirements,
            salary_min,
            salary_max,
            deadline,
        } => {
            guard(api, "/post-job").await?;
            let (salary_min, salary_max) = salary_range(&salary_min, &salary_max)?;
            let update = JobUpdate {
                title,
                description,
                location,
                remote,
                experience_level,
                salary_min,
                salary_max,
                status,
                requirements: (!requirements.is_empty()).then_some(requirements),
                application_deadline: deadline.map(|d| d.trim().to_owned()).filter(|d| !d.is_empty()),
            };
            let job = api.update_job(&job_id, &update).await?;
            print_json(&job)
        }
        JobsSubcommand::Delete { job_id } => {
            guard(api, "/post-job").await?;
            api.delete_job(&job_id).await?;
            eprintln!("deleted job: {job_id}");
            Ok(())
        }
    }
}

async fn run_apply(api: &JobBoardApi, job_id: &str, cover_letter: String) -> Result<(), CliError> {
    let path = format!("/jobs/{job_id}");
    guard(api, &path).await?;
    let mut view = JobDetailView::new(api.clone(), job_id);
    view.load().await;
    check(&view.state, &path)?;
    if view.not_found {
        return Err(CliError::Api(ApiError::NotFound));
    }
    view.cover_letter = cover_letter;
    view.apply().await;
    if let Some(target) = view.state.redirect {
        return Err(CliError::Redirected { path, target: target.to_owned() });
    }
    check(&view.state, &path)?;
    print_json(&view.application)
}

async fn run_applications(api: &JobBoardApi, apps: ApplicationsCommand) -> Result<(), CliError> {
    match apps.command {
        ApplicationsSubcommand::List { status } => {
            guard(api, "/applications").await?;
            let mut view = ApplicationsView::new(api.clone());
            view.status_filter = status;
            view.load().await;
            check(&view.state, "/applications")?;
            print_json(&view.applications)
        }
        ApplicationsSubcommand::Status { application_id, status } => {
            guard(api, "/employer/dashboard").await?;
            let mut view = EmployerDashboardView::new(api.clone());
            view.update_status(&application_id, status).await;
            check(&view.state, "/employer/dashboard")?;
            print_json(&view.applications.iter().find(|a| a.id == application_id))
        }
    }
}

async fn run_dashboard(api: &JobBoardApi) -> Result<(), CliError> {
    guard(api, "/employer/dashboard").await?;
    let mut view = EmployerDashboardView::new(api.clone());
    view.load().await;
    if let (Some(message), Some(_)) = (view.jobs_error, view.applications_error) {
        return Err(CliError::View(message));
    }
    check(&view.state, "/employer/dashboard").or_else(|e| match e {
        CliError::View(message) => {
            tracing::warn!(message, "dashboard partially loaded");
            Ok(())
        }
        other => Err(other),
    })?;
    let stats = view.stats();
    print_json(&json!({
        "activeJobs": stats.active_jobs,
        "totalApplications": stats.total_applications,
        "awaitingReview": stats.awaiting_review,
        "jobs": view.jobs,
        "applications": view.applications,
    }))
}

async fn run_messages(api: &JobBoardApi, messages: MessagesCommand) -> Result<(), CliError> {
    guard(api, "/messages").await?;
    let mut view = MessagingView::new(api.clone());
    match messages.command {
        MessagesSubcommand::Conversations => {
            view.load_conversations().await;
            check(&view.state, "/messages")?;
            print_json(&view.conversations)
        }
        MessagesSubcommand::Thread { user_id } => {
            view.open(&user_id).await;
            check(&view.state, "/messages")?;
            print_json(&view.thread)
        }
        MessagesSubcommand::Send { user_id, content } => {
            view.open(&user_id).await;
            view.draft = content;
            if !view.send().await {
                check(&view.state, "/messages")?;
                return Err(CliError::View("Nothing to send."));
            }
            print_json(&view.thread)
        }
    }
}

async fn run_notifications(api: &JobBoardApi, notifications: NotificationsCommand) -> Result<(), CliError> {
    guard(api, "/notifications").await?;
    let mut view = NotificationsView::new(api.clone());
    match notifications.command {
        NotificationsSubcommand::List => {
            view.load().await;
            check(&view.state, "/notifications")?;
            print_json(&json!({ "unread": view.unread_count(), "items": view.items }))
        }
        NotificationsSubcommand::Read { notification_id } => {
            view.mark_read(&notification_id).await;
            check(&view.state, "/notifications")?;
            eprintln!("marked read: {notification_id}");
            Ok(())
        }
    }
}

async fn run_profile(api: &JobBoardApi, profile: ProfileCommand) -> Result<(), CliError> {
    guard(api, "/profile").await?;
    let mut view = ProfileView::new(api.clone());
    match profile.command {
        ProfileSubcommand::Show => {
            view.load().await;
            check(&view.state, "/profile")?;
            print_json(&view.user)
        }
        ProfileSubcommand::Update { first_name, last_name, email, company_name } => {
            let update = ProfileUpdate { first_name, last_name, email, company_name };
            if update.is_empty() {
                return Err(CliError::View("Nothing to update."));
            }
            view.save(update).await;
            check(&view.state, "/profile")?;
            print_json(&view.user)
        }
        ProfileSubcommand::UploadResume { path } => {
            view.upload_resume(&path).await;
            check(&view.state, "/profile")?;
            eprintln!("uploaded resume: {}", path.display());
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
