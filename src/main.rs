mod api;
mod event;
mod model;
mod session;
mod state;
mod transport;
mod views;

use std::collections::HashMap;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::time::timeout;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::model::{Experience, ExperienceStatus, Role, SessionKind};
use crate::session::{BindingConfig, Identity, SessionBinding};
use crate::state::{ConnectionStatus, LiveView};
use crate::transport::WsChannel;

#[derive(Debug, thiserror::Error)]
enum ConsoleError {
    #[error(transparent)]
    Api(#[from] api::ApiError),
    #[error(transparent)]
    Transport(#[from] transport::TransportError),
    #[error(transparent)]
    Kind(#[from] model::KindError),
    #[error(transparent)]
    Status(#[from] model::StatusError),
}

#[derive(Parser, Debug)]
#[command(name = "imersiva-console", about = "Imersiva teacher console")]
struct Cli {
    /// Backend REST base URL.
    #[arg(long, env = "IMERSIVA_BASE_URL", default_value = "http://localhost:3001")]
    base_url: String,

    /// Push server base URL.
    #[arg(long, env = "IMERSIVA_WS_URL", default_value = "http://localhost:3002")]
    ws_url: String,

    /// Session token from a previous login.
    #[arg(long, env = "IMERSIVA_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate and print a session token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List the school's classes.
    Classes,
    Experience(ExperienceCommand),
}

#[derive(Args, Debug)]
struct ExperienceCommand {
    #[command(subcommand)]
    command: ExperienceSubcommand,
}

#[derive(Subcommand, Debug)]
enum ExperienceSubcommand {
    /// Create an experience for a class; the backend assigns the PIN.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        class_id: Uuid,
    },
    /// Show one experience's metadata.
    Show { pin: String },
    /// Move the experience to ONGOING.
    Start { pin: String },
    /// Notify connected students and move the experience to ENDED.
    End { pin: String },
    /// Follow the live session until interrupted.
    Watch {
        pin: String,
        #[arg(long, default_value = "prof")]
        teacher_id: String,
        #[arg(long, default_value = "Teacher")]
        display_name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), ConsoleError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let api = ApiClient::new(cli.base_url.clone(), cli.token.clone());
    let ws_url = cli.ws_url.clone();

    match cli.command {
        Command::Login { email, password } => run_login(&api, &email, &password).await,
        Command::Classes => run_classes(&api).await,
        Command::Experience(experience) => match experience.command {
            ExperienceSubcommand::Create { name, class_id } => run_create(&api, &name, class_id).await,
            ExperienceSubcommand::Show { pin } => run_show(&api, &pin).await,
            ExperienceSubcommand::Start { pin } => run_start(&api, &pin).await,
            ExperienceSubcommand::End { pin } => run_end(&api, &ws_url, &pin).await,
            ExperienceSubcommand::Watch { pin, teacher_id, display_name } => {
                run_watch(&api, &ws_url, &pin, teacher_id, display_name).await
            }
        },
    }
}

async fn run_login(api: &ApiClient, email: &str, password: &str) -> Result<(), ConsoleError> {
    let user = api.login(email, password).await?;
    println!("logged in as {} <{}>", user.name, user.email);
    if let Some(token) = api.token().await {
        println!("export IMERSIVA_TOKEN={token}");
    }
    Ok(())
}

async fn run_classes(api: &ApiClient) -> Result<(), ConsoleError> {
    let school = api.school_with_classes().await?;
    println!("{} - {} classes", school.name, school.classes.len());
    for class in &school.classes {
        println!("  {} (grade {})  {}", class.name, class.grade, class.id);
    }
    Ok(())
}

async fn run_create(api: &ApiClient, name: &str, class_id: Uuid) -> Result<(), ConsoleError> {
    let experience = api.create_experience(name, class_id).await?;
    println!("created \"{}\" - PIN {}", experience.name, experience.pin);
    Ok(())
}

async fn run_show(api: &ApiClient, pin: &str) -> Result<(), ConsoleError> {
    let experience = api.get_experience(pin).await?;
    print_experience(&experience);
    Ok(())
}

async fn run_start(api: &ApiClient, pin: &str) -> Result<(), ConsoleError> {
    let experience = api.get_experience(pin).await?;
    let next = experience.status.advance_to(ExperienceStatus::Ongoing)?;
    let updated = api.update_experience_status(&experience.pin, next).await?;
    println!("experience {} is now {}", updated.pin, updated.status);
    Ok(())
}

async fn run_end(api: &ApiClient, ws_url: &str, pin: &str) -> Result<(), ConsoleError> {
    let experience = api.get_experience(pin).await?;
    let next = experience.status.advance_to(ExperienceStatus::Ended)?;

    // Tell connected students the session is over, then persist the status.
    let channel = WsChannel::new(WsChannel::endpoint(ws_url)?);
    let mut binding = SessionBinding::open(
        BindingConfig {
            pin: experience.pin.clone(),
            kind: experience.kind().ok(),
            identity: teacher_identity("prof".to_owned(), "Teacher".to_owned()),
        },
        Box::new(channel),
    );
    wait_connected(&binding, Duration::from_secs(5)).await;
    binding.end_session().await;
    binding.close().await;

    let updated = api.update_experience_status(&experience.pin, next).await?;
    println!("experience {} is now {}", updated.pin, updated.status);
    Ok(())
}

async fn run_watch(
    api: &ApiClient,
    ws_url: &str,
    pin: &str,
    teacher_id: String,
    display_name: String,
) -> Result<(), ConsoleError> {
    let experience = api.get_experience(pin).await?;
    let kind = experience.kind()?;

    let channel = WsChannel::new(WsChannel::endpoint(ws_url)?);
    let mut binding = SessionBinding::open(
        BindingConfig {
            pin: experience.pin.clone(),
            kind: Some(kind),
            identity: teacher_identity(teacher_id, display_name),
        },
        Box::new(channel),
    );
    let mut changes = binding.changes();

    let names: HashMap<String, String> = experience
        .students
        .iter()
        .map(|student| (student.id.to_string(), student.name.clone()))
        .collect();

    render_watch(&experience, kind, &binding.snapshot().await, &names);
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                render_watch(&experience, kind, &binding.snapshot().await, &names);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    binding.close().await;
    Ok(())
}

fn teacher_identity(participant_id: String, display_name: String) -> Identity {
    Identity { participant_id, display_name, role: Role::Teacher }
}

/// Wait until the binding reports connected, or give up after `wait`.
async fn wait_connected(binding: &SessionBinding, wait: Duration) {
    let mut changes = binding.changes();
    let _ = timeout(wait, async {
        loop {
            if binding.snapshot().await.status == ConnectionStatus::Connected {
                break;
            }
            if changes.changed().await.is_err() {
                break;
            }
        }
    })
    .await;
}

fn print_experience(experience: &Experience) {
    println!("{} - PIN {}", experience.name, experience.pin);
    println!("  scenario: {}", experience.template_name);
    println!("  status:   {}", experience.status);
    println!("  students: {}", experience.students.len());
    for student in &experience.students {
        println!("    {} ({})", student.name, student.id);
    }
}

fn render_watch(
    experience: &Experience,
    kind: SessionKind,
    view: &LiveView,
    names: &HashMap<String, String>,
) {
    println!("== {} (PIN {}, {}) ==", experience.name, experience.pin, experience.status);
    print!("{}", views::roster::render_roster(&experience.students, view));
    match kind {
        SessionKind::Restaurant => print!("{}", views::messages::render_messages(view, names)),
        SessionKind::Fair => print!("{}", views::cards::render_cards(&experience.students, view)),
    }
    println!();
}
