use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use edusync_core::model::AssessmentId;
use gateway::{AssessmentGateway, HttpGateway, HttpGatewayConfig};
use services::{
    AssessmentLoopService, Clock, FileTokenStore, SessionContext, SessionHandle,
    SubmissionFailurePolicy,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use ui::vm::AssessmentView;

mod demo;
mod terminal;

use terminal::Input;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidAssessmentId { raw: String },
    InvalidPolicy { raw: String },
    InvalidMinutes { raw: String },
    MissingAssessmentId,
    MissingToken,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidAssessmentId { raw } => {
                write!(f, "invalid --assessment-id value: {raw}")
            }
            ArgsError::InvalidPolicy { raw } => write!(f, "invalid --failure-policy value: {raw}"),
            ArgsError::InvalidMinutes { raw } => write!(f, "invalid --minutes value: {raw}"),
            ArgsError::MissingAssessmentId => write!(f, "take requires --assessment-id"),
            ArgsError::MissingToken => write!(f, "login requires --token"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug)]
enum AccessError {
    NoTokenPath,
    NotSignedIn,
    NotStudent,
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::NoTokenPath => {
                write!(f, "no config directory found; set EDUSYNC_TOKEN_PATH")
            }
            AccessError::NotSignedIn => {
                write!(f, "not signed in; run `app login --token <jwt>` or use --demo")
            }
            AccessError::NotStudent => write!(f, "only students can take assessments"),
        }
    }
}

impl std::error::Error for AccessError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app take --assessment-id <id> [--api <url>] [--failure-policy <policy>]");
    eprintln!("  app take --assessment-id <id> --demo [--minutes <n>]");
    eprintln!("  app login --token <jwt>");
    eprintln!("  app logout");
    eprintln!("  app whoami");
    eprintln!();
    eprintln!("Policies:");
    eprintln!("  surface      show submission failures (default)");
    eprintln!("  placeholder  show a flagged placeholder result instead");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EDUSYNC_API_URL, EDUSYNC_API_TIMEOUT_SECS, EDUSYNC_API_RETRIES,");
    eprintln!("  EDUSYNC_TOKEN_PATH, EDUSYNC_SUBMISSION_FAILURE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    Login,
    Logout,
    Whoami,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "login" => Some(Self::Login),
            "logout" => Some(Self::Logout),
            "whoami" => Some(Self::Whoami),
            _ => None,
        }
    }
}

struct TakeArgs {
    assessment_id: AssessmentId,
    api_url: Option<String>,
    policy: SubmissionFailurePolicy,
    demo: bool,
    demo_minutes: Option<u32>,
}

impl TakeArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut assessment_id = None;
        let mut api_url = None;
        let mut policy = match std::env::var("EDUSYNC_SUBMISSION_FAILURE") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ArgsError::InvalidPolicy { raw })?,
            Err(_) => SubmissionFailurePolicy::default(),
        };
        let mut demo = false;
        let mut demo_minutes = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--assessment-id" => {
                    let value = require_value(args, "--assessment-id")?;
                    let parsed = value
                        .parse::<AssessmentId>()
                        .ok()
                        .filter(|_| !value.trim().is_empty())
                        .ok_or_else(|| ArgsError::InvalidAssessmentId { raw: value.clone() })?;
                    assessment_id = Some(parsed);
                }
                "--api" => api_url = Some(require_value(args, "--api")?),
                "--failure-policy" => {
                    let value = require_value(args, "--failure-policy")?;
                    policy = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPolicy { raw: value.clone() })?;
                }
                "--demo" => demo = true,
                "--minutes" => {
                    let value = require_value(args, "--minutes")?;
                    let parsed: u32 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidMinutes { raw: value.clone() })?;
                    demo_minutes = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            assessment_id: assessment_id.ok_or(ArgsError::MissingAssessmentId)?,
            api_url,
            policy,
            demo,
            demo_minutes,
        })
    }
}

fn parse_token(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let mut token = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--token" => token = Some(require_value(args, "--token")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    token.ok_or(ArgsError::MissingToken)
}

fn expect_no_args(args: &mut impl Iterator<Item = String>) -> Result<(), ArgsError> {
    match args.next() {
        Some(arg) => Err(ArgsError::UnknownArg(arg)),
        None => Ok(()),
    }
}

fn token_path() -> Result<PathBuf, AccessError> {
    std::env::var_os("EDUSYNC_TOKEN_PATH")
        .map(PathBuf::from)
        .or_else(FileTokenStore::default_path)
        .ok_or(AccessError::NoTokenPath)
}

fn session_context(clock: Clock) -> Result<SessionContext, Box<dyn std::error::Error>> {
    let store = FileTokenStore::new(token_path()?);
    debug!(path = %store.path().display(), "using token store");
    let mut context = SessionContext::new(Arc::new(store)).with_clock(clock);
    context.init()?;
    Ok(context)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let mut iter = argv.into_iter();

    let cmd = match iter.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let clock = Clock::default_clock();
    let report = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };

    match cmd {
        Command::Take => {
            let args = TakeArgs::parse(&mut iter).map_err(report)?;
            take(args, clock).await
        }
        Command::Login => {
            let token = parse_token(&mut iter).map_err(report)?;
            let mut context = session_context(clock)?;
            let role = context.login(&token)?;
            println!("Signed in as {role}.");
            Ok(())
        }
        Command::Logout => {
            expect_no_args(&mut iter).map_err(report)?;
            let mut context = session_context(clock)?;
            context.logout()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            expect_no_args(&mut iter).map_err(report)?;
            let context = session_context(clock)?;
            match context.claims() {
                Some(claims) => println!(
                    "{} <{}> ({})",
                    claims.name.as_deref().unwrap_or(&claims.sub),
                    claims.email.as_deref().unwrap_or("no email"),
                    claims.role()
                ),
                None => println!("Not signed in."),
            }
            Ok(())
        }
    }
}

async fn take(args: TakeArgs, clock: Clock) -> Result<(), Box<dyn std::error::Error>> {
    let gateway: Arc<dyn AssessmentGateway> = if args.demo {
        info!(assessment_id = %args.assessment_id, "using offline demo assessment");
        Arc::new(demo::gateway(args.assessment_id.clone(), args.demo_minutes)?)
    } else {
        let mut context = session_context(clock)?;
        if !context.is_authenticated() {
            return Err(AccessError::NotSignedIn.into());
        }
        if !context.is_student() {
            return Err(AccessError::NotStudent.into());
        }

        let mut config = HttpGatewayConfig::from_env();
        if let Some(url) = args.api_url {
            config = config.with_base_url(url);
        }
        let http = HttpGateway::new(config)?
            .with_bearer_token(context.bearer_token().map(str::to_owned));
        context.teardown();
        Arc::new(http)
    };

    let service = AssessmentLoopService::new(clock, gateway).with_failure_policy(args.policy);
    let handle = service.spawn_session(args.assessment_id);
    drive(&handle).await?;

    let session = handle.join().await?;
    debug!(?session, "session finished");
    Ok(())
}

/// Feed stdin commands to the session and redraw whenever its view changes.
async fn drive(handle: &SessionHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown: Option<AssessmentView> = None;
    let mut warned_urgent = false;
    let mut confirming = false;

    loop {
        let view = AssessmentView::from_snapshot(&snapshots.borrow_and_update());
        let key = terminal::redraw_key(&view);
        if shown.as_ref() != Some(&key) {
            println!("\n{}", terminal::render(&view));
            shown = Some(key);
        }
        if let AssessmentView::Taking(question) = &view {
            if question.urgent && !warned_urgent {
                println!("Less than a minute left ({}).", question.countdown);
                warned_urgent = true;
            }
        }
        if matches!(view, AssessmentView::Completed(_) | AssessmentView::Failed { .. }) {
            return Ok(());
        }

        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    handle.cancel();
                    return Ok(());
                };
                let AssessmentView::Taking(question) = &view else {
                    continue;
                };
                let Some(input) = Input::parse(&line) else {
                    println!("Unrecognized command. Type h for help.");
                    continue;
                };

                if confirming {
                    confirming = false;
                    if input == Input::Confirm {
                        if let Err(err) = handle.submit().await {
                            println!("{err}");
                        }
                    } else {
                        println!("Submission cancelled.");
                    }
                    continue;
                }

                let result = match input {
                    Input::Choose(n) => match question.options.get(n - 1) {
                        Some(option) => handle.select_answer(question.index, option.id.clone()).await,
                        None => {
                            println!("No option {n} on this question.");
                            continue;
                        }
                    },
                    Input::Next => handle.next().await,
                    Input::Previous => handle.previous().await,
                    Input::GoTo(n) => handle.go_to(n - 1).await,
                    Input::Submit => {
                        if terminal::can_submit(question) {
                            if let Some(warning) = question.confirm.warning {
                                println!("{warning}");
                            }
                            println!("{} [y/N]", question.confirm.message);
                            confirming = true;
                        } else {
                            println!("Answer the remaining questions first.");
                        }
                        continue;
                    }
                    Input::Confirm | Input::Decline => continue,
                    Input::Help => {
                        println!("{}", terminal::HELP);
                        continue;
                    }
                    Input::Quit => {
                        handle.cancel();
                        println!("Left without submitting.");
                        return Ok(());
                    }
                };
                if let Err(err) = result {
                    println!("{err}");
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        // Binary glue: print once.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
