//! Command-line interface
//!
//! Each subcommand logs in (where it needs a user), runs one assistant
//! action and prints the assistant's messages as they change.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use smartcal_core::CreationOutcome;
use smartcal_domain::{DisplayMessage, ParsedEvent};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::context::AppContext;
use crate::render;
use crate::utils::logging::{error_label, log_command_execution};

/// SmartCal: create calendar events from plain language
#[derive(Debug, Parser)]
#[command(name = "smartcal", version)]
pub struct Cli {
    /// Default log filter when RUST_LOG is not set
    #[arg(long, global = true, env = "SMARTCAL_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Explicit config file instead of the probed locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Who to log in as
#[derive(Debug, Clone, Args)]
pub struct Identity {
    #[arg(long, env = "SMARTCAL_NAME")]
    pub name: String,

    #[arg(long, env = "SMARTCAL_EMAIL")]
    pub email: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the backend is reachable
    Health,

    /// Show whether Google Calendar is connected for the user
    AuthStatus {
        #[command(flatten)]
        identity: Identity,
    },

    /// Drop the backend's cached calendar access so the next event asks for consent again
    ForgetAuth {
        #[command(flatten)]
        identity: Identity,
    },

    /// Describe an event and create it
    Create {
        #[command(flatten)]
        identity: Identity,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,

        /// The event, e.g. "Dentist on Friday at 3pm"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Interactive session: one event description per line
    Chat {
        #[command(flatten)]
        identity: Identity,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::AuthStatus { .. } => "auth-status",
            Self::ForgetAuth { .. } => "forget-auth",
            Self::Create { .. } => "create",
            Self::Chat { .. } => "chat",
        }
    }
}

type InputLines = Lines<BufReader<Stdin>>;

/// Run one subcommand to completion.
///
/// Returns whether the command achieved what was asked.
///
/// # Errors
/// Returns an error for failures that were not already shown to the user.
pub async fn run(command: Command, ctx: &AppContext) -> anyhow::Result<bool> {
    let name = command.name();
    let started = Instant::now();
    let printer = MessagePrinter::spawn(ctx.assistant.subscribe_messages());

    let result = dispatch(command, ctx).await;
    printer.finish().await;

    log_command_execution(name, started.elapsed(), matches!(result, Ok(true)));
    result
}

async fn dispatch(command: Command, ctx: &AppContext) -> anyhow::Result<bool> {
    let assistant = &ctx.assistant;

    match command {
        Command::Health => {
            let report = assistant.probe().await;
            println!("{}", render::probe_line(&report));
            Ok(report.reachable)
        }
        Command::AuthStatus { identity } => {
            if !login(ctx, &identity).await {
                return Ok(false);
            }
            let state = assistant.refresh_authorization().await?;
            println!("{}", render::authorization_badge(state));
            assistant.logout();
            Ok(state.is_authorized())
        }
        Command::ForgetAuth { identity } => {
            if !login(ctx, &identity).await {
                return Ok(false);
            }
            assistant.forget_authorization().await?;
            println!("Calendar authorization cleared for {}.", identity.email);
            assistant.logout();
            Ok(true)
        }
        Command::Create { identity, yes, text } => {
            if !login(ctx, &identity).await {
                return Ok(false);
            }
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            let created = describe_and_create(ctx, &text.join(" "), yes, &mut input).await?;
            assistant.logout();
            Ok(created)
        }
        Command::Chat { identity } => {
            if !login(ctx, &identity).await {
                return Ok(false);
            }
            chat(ctx).await?;
            assistant.logout();
            Ok(true)
        }
    }
}

/// Failures are already on screen through the message channel.
async fn login(ctx: &AppContext, identity: &Identity) -> bool {
    match ctx.assistant.login(&identity.name, &identity.email).await {
        Ok(_) => true,
        Err(err) => {
            warn!(
                error = %err,
                label = error_label(&err),
                category = ?err.category(),
                "login failed"
            );
            false
        }
    }
}

async fn describe_and_create(
    ctx: &AppContext,
    text: &str,
    skip_prompt: bool,
    input: &mut InputLines,
) -> anyhow::Result<bool> {
    let parsed = match ctx.assistant.parse(text).await {
        Ok(parsed) if parsed.successful => parsed,
        Ok(_) => return Ok(false),
        Err(err) => {
            warn!(
                error = %err,
                label = error_label(&err),
                category = ?err.category(),
                "request not parsed"
            );
            return Ok(false);
        }
    };

    println!("{}", render::event_preview(&parsed));
    if !skip_prompt && !ask(input, "Create this event? [y/N] ").await? {
        ctx.assistant.cancel();
        println!("Not created.");
        return Ok(false);
    }

    Ok(confirm(ctx, parsed).await?.is_success())
}

/// Confirm `parsed`; Ctrl-C abandons the confirmation and waits for the
/// flow to wind down.
async fn confirm(ctx: &AppContext, parsed: ParsedEvent) -> anyhow::Result<CreationOutcome> {
    let confirmation = ctx.assistant.confirm(parsed);
    tokio::pin!(confirmation);

    let outcome = tokio::select! {
        outcome = &mut confirmation => outcome?,
        _ = tokio::signal::ctrl_c() => {
            ctx.assistant.cancel();
            println!("Cancelled.");
            (&mut confirmation).await?
        }
    };
    Ok(outcome)
}

async fn chat(ctx: &AppContext) -> anyhow::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", render::authorization_badge(ctx.assistant.authorization_state()));
    println!("Describe an event, or :auth, :forget, :quit");

    loop {
        prompt("> ").await?;
        let Some(line) = input.next_line().await.context("failed to read input")? else {
            return Ok(());
        };

        match line.trim() {
            "" => continue,
            ":quit" | ":q" => return Ok(()),
            ":auth" => match ctx.assistant.refresh_authorization().await {
                Ok(state) => println!("{}", render::authorization_badge(state)),
                Err(err) => println!("Could not check authorization: {err}"),
            },
            ":forget" => match ctx.assistant.forget_authorization().await {
                Ok(()) => println!("Calendar authorization cleared."),
                Err(err) => println!("Could not clear authorization: {err}"),
            },
            text => {
                describe_and_create(ctx, text, false, &mut input).await?;
            }
        }
    }
}

async fn ask(input: &mut InputLines, question: &str) -> anyhow::Result<bool> {
    prompt(question).await?;
    let answer = input.next_line().await.context("failed to read input")?;
    Ok(matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes")))
}

async fn prompt(text: &str) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

/// Prints each new assistant message until told to stop.
struct MessagePrinter {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl MessagePrinter {
    fn spawn(mut messages: watch::Receiver<Option<DisplayMessage>>) -> Self {
        let (stop, mut stopped) = oneshot::channel();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    changed = messages.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        print_current(&mut messages);
                    }
                    _ = &mut stopped => break,
                }
            }
            // Last message may have landed together with the stop signal.
            if messages.has_changed().unwrap_or(false) {
                print_current(&mut messages);
            }
        });
        Self { stop, task }
    }

    async fn finish(self) {
        let _ = self.stop.send(());
        if let Err(err) = self.task.await {
            warn!(error = %err, "message printer stopped abnormally");
        }
    }
}

fn print_current(messages: &mut watch::Receiver<Option<DisplayMessage>>) {
    if let Some(message) = messages.borrow_and_update().as_ref() {
        println!("{}", render::message_line(message));
    }
}
