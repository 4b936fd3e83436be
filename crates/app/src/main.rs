use std::fmt;

use quiz_api::{ApiConfig, ConfigError};
use quiz_core::model::{
    AccountError, Credentials, OptionId, QuestionId, QuizId, QuizSubmission, Qualification,
    Registration,
};
use quiz_core::time::parse_server_date;
use services::{ClientStore, StoreError};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt as log_fmt, prelude::*};

const EMAIL_ENV: &str = "QUIZ_EMAIL";
const PASSWORD_ENV: &str = "QUIZ_PASSWORD";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingRequired { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidValue { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingRequired { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn required<'a>(value: &'a Option<String>, flag: &'static str) -> Result<&'a str, ArgsError> {
    value
        .as_deref()
        .ok_or(ArgsError::MissingRequired { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz register    --name <name> --email <email> --password <pw>");
    eprintln!("                   --qualification <level> --dob <YYYY-MM-DD>");
    eprintln!("  quiz subjects    [--email <email> --password <pw>]");
    eprintln!("  quiz quizzes     [--email <email> --password <pw>]");
    eprintln!("  quiz scores      [--email <email> --password <pw>]");
    eprintln!("  quiz stats       [--email <email> --password <pw>]");
    eprintln!("  quiz admin-stats [--email <email> --password <pw>]");
    eprintln!("  quiz take        --quiz-id <id> --answer <question>=<option> ...");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --base-url <url>   API base (default: http://127.0.0.1:5000/api)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_API_TIMEOUT_SECS, QUIZ_EMAIL, QUIZ_PASSWORD, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Register,
    LoggedIn(SessionCommand),
}

/// Commands that run between a login and the matching logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionCommand {
    Subjects,
    Quizzes,
    Scores,
    Stats,
    AdminStats,
    Take,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        let session = match arg {
            "register" => return Some(Self::Register),
            "subjects" => SessionCommand::Subjects,
            "quizzes" => SessionCommand::Quizzes,
            "scores" => SessionCommand::Scores,
            "stats" => SessionCommand::Stats,
            "admin-stats" => SessionCommand::AdminStats,
            "take" => SessionCommand::Take,
            _ => return None,
        };
        Some(Self::LoggedIn(session))
    }
}

#[derive(Debug, Default)]
struct Args {
    base_url: Option<String>,
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
    qualification: Option<String>,
    dob: Option<String>,
    quiz_id: Option<QuizId>,
    answers: Vec<(QuestionId, OptionId)>,
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            email: env(EMAIL_ENV),
            password: env(PASSWORD_ENV),
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => parsed.base_url = Some(require_value(args, "--base-url")?),
                "--email" => parsed.email = Some(require_value(args, "--email")?),
                "--password" => parsed.password = Some(require_value(args, "--password")?),
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--qualification" => {
                    parsed.qualification = Some(require_value(args, "--qualification")?);
                }
                "--dob" => parsed.dob = Some(require_value(args, "--dob")?),
                "--quiz-id" => {
                    let value = require_value(args, "--quiz-id")?;
                    let id = value.parse().map_err(|_| ArgsError::InvalidValue {
                        flag: "--quiz-id",
                        raw: value.clone(),
                    })?;
                    parsed.quiz_id = Some(id);
                }
                "--answer" => {
                    let value = require_value(args, "--answer")?;
                    parsed.answers.push(parse_answer(&value)?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn credentials(&self) -> Result<Credentials, Box<dyn std::error::Error>> {
        let email = required(&self.email, "--email")?;
        let password = required(&self.password, "--password")?;
        Ok(Credentials::new(email, password)?)
    }

    fn registration(&self) -> Result<Registration, Box<dyn std::error::Error>> {
        let registration = build_registration(
            required(&self.name, "--name")?,
            required(&self.email, "--email")?,
            required(&self.password, "--password")?,
            required(&self.qualification, "--qualification")?,
            required(&self.dob, "--dob")?,
        )?;
        Ok(registration)
    }

    fn submission(&self) -> QuizSubmission {
        self.answers
            .iter()
            .fold(QuizSubmission::new(), |submission, (question, option)| {
                submission.select(*question, *option)
            })
    }
}

fn parse_answer(raw: &str) -> Result<(QuestionId, OptionId), ArgsError> {
    let invalid = || ArgsError::InvalidValue {
        flag: "--answer",
        raw: raw.to_owned(),
    };
    let (question, option) = raw.split_once('=').ok_or_else(invalid)?;
    Ok((
        question.parse().map_err(|_| invalid())?,
        option.parse().map_err(|_| invalid())?,
    ))
}

fn build_registration(
    name: &str,
    email: &str,
    password: &str,
    qualification: &str,
    dob: &str,
) -> Result<Registration, quiz_core::Error> {
    let qualification: Qualification = qualification.parse()?;
    let dob = parse_server_date(dob).ok_or_else(|| quiz_core::Error::InvalidDate {
        raw: dob.to_owned(),
    })?;
    Ok(Registration::new(name, email, password, qualification, dob)?)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Stdout carries command output only.
    tracing_subscriber::registry()
        .with(log_fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            print_usage();
            ArgsError::UnknownCommand(first.clone())
        })?,
    };

    let args = Args::parse(&mut argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut config = ApiConfig::from_env()?;
    if let Some(base_url) = &args.base_url {
        config = ApiConfig::new(base_url)?.with_timeout(config.timeout());
    }
    let store = ClientStore::http(config)?;

    let cmd = match cmd {
        Command::Register => {
            let registration = args.registration()?;
            store.register(&registration).await?;
            println!("registered {}", registration.email());
            return Ok(());
        }
        Command::LoggedIn(cmd) => cmd,
    };

    store.login(&args.credentials()?).await?;
    let outcome = run_logged_in(cmd, &args, &store).await;

    // Drop the server-side cookie whatever happened above.
    if let Err(err) = store.end_session().await {
        warn!(error = %err, "failed to end session");
    }
    outcome
}

async fn run_logged_in(
    cmd: SessionCommand,
    args: &Args,
    store: &ClientStore,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        SessionCommand::Subjects => {
            let subjects = store.fetch_subjects().await?;
            println!("{}", serde_json::to_string_pretty(&subjects)?);
        }
        SessionCommand::Quizzes => {
            let quizzes = store.fetch_quizzes().await?;
            println!("{}", serde_json::to_string_pretty(&quizzes)?);
        }
        SessionCommand::Scores => {
            let scores = store.fetch_scores().await?;
            println!("{}", serde_json::to_string_pretty(&scores)?);
        }
        SessionCommand::Stats => {
            let stats = store.fetch_user_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        SessionCommand::AdminStats => match store.fetch_admin_stats().await? {
            Some(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
            None => eprintln!("admin stats require an admin account"),
        },
        SessionCommand::Take => {
            let quiz = args
                .quiz_id
                .ok_or(ArgsError::MissingRequired { flag: "--quiz-id" })?;
            store.set_navbar_hidden(true);
            store.start_quiz(quiz);
            let submitted = store.submit_quiz(&args.submission()).await;
            store.set_navbar_hidden(false);
            submitted?;
            let scores = store.fetch_scores().await?;
            println!("{}", serde_json::to_string_pretty(&scores)?);
        }
    }
    Ok(())
}

/// Bad input exits with 2; failures talking to the server exit with 1.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    let bad_input = err.is::<ArgsError>()
        || err.is::<quiz_core::Error>()
        || err.is::<AccountError>()
        || err.is::<ConfigError>();
    if bad_input { 2 } else { 1 }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(exit_code(err.as_ref()));
    }
}
