//! Command scripts for the driver binary
//!
//! One command per line; `#` starts a comment. Request commands do not wait
//! for their transition, so consecutive lines behave like interleaved callers.
//! Outstanding requests are awaited by `settle` and at the end of the script.

use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use crate::coordinator::{Completion, Coordinator, HookSet};

/// A single script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Suspend(Duration),
    Resuspend(Duration),
    Resume,
    Wakeup,
    Wait,
    Sleep(Duration),
    Settle,
    Status,
}

fn parse_ms(arg: Option<&str>, what: &str) -> Result<Duration> {
    let raw = arg.ok_or_else(|| eyre!("{} needs a duration in ms", what))?;
    let ms: u64 = raw.parse().context(format!("invalid duration '{}'", raw))?;
    Ok(Duration::from_millis(ms))
}

impl FromStr for ScriptCommand {
    type Err = eyre::Report;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or_else(|| eyre!("empty command"))?;
        let arg = words.next();
        if let Some(extra) = words.next() {
            return Err(eyre!("unexpected argument '{}'", extra));
        }

        let cmd = match name {
            "suspend" => match arg {
                Some(_) => ScriptCommand::Suspend(parse_ms(arg, name)?),
                None => ScriptCommand::Suspend(Duration::ZERO),
            },
            "resuspend" => ScriptCommand::Resuspend(parse_ms(arg, name)?),
            "sleep" => ScriptCommand::Sleep(parse_ms(arg, name)?),
            "resume" | "wakeup" | "wait" | "settle" | "status" => {
                if let Some(arg) = arg {
                    return Err(eyre!("{} takes no argument, got '{}'", name, arg));
                }
                match name {
                    "resume" => ScriptCommand::Resume,
                    "wakeup" => ScriptCommand::Wakeup,
                    "wait" => ScriptCommand::Wait,
                    "settle" => ScriptCommand::Settle,
                    _ => ScriptCommand::Status,
                }
            }
            other => return Err(eyre!("unknown command '{}'", other)),
        };
        Ok(cmd)
    }
}

/// Parse a whole script, naming the offending line on error
pub fn parse_script(text: &str) -> Result<Vec<ScriptCommand>> {
    let mut commands = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let cmd = line.parse::<ScriptCommand>().context(format!("line {}", index + 1))?;
        commands.push(cmd);
    }
    debug!(count = commands.len(), "parse_script: parsed");
    Ok(commands)
}

/// Hooks used by the driver: report every transition on stdout
pub fn driver_hooks(poll_remaining: Option<Duration>) -> HookSet {
    let hooks = HookSet::new()
        .on_resume(|| async {
            println!("{} resuming...", "▶".green());
            Ok(())
        })
        .on_suspend(|| async {
            println!("{} suspending...", "■".yellow());
            Ok(())
        })
        .on_suspend_cancelled(|| async {
            println!("{} suspend cancelled", "↺".cyan());
            Ok(())
        })
        .on_wakeup(|| async {
            println!("{} waking up...", "☀".magenta());
            Ok(())
        });

    match poll_remaining {
        Some(remaining) => hooks.poll_linger_with(move || async move {
            println!("{} poll {}", "?".dimmed(), chrono::Utc::now().to_rfc3339());
            Ok(Some(remaining))
        }),
        None => hooks,
    }
}

/// Executes script commands against one coordinator
pub struct ScriptRunner<W: Write> {
    coord: Coordinator,
    pending: Vec<Completion>,
    out: W,
}

impl<W: Write> ScriptRunner<W> {
    pub fn new(coord: Coordinator, out: W) -> Self {
        Self {
            coord,
            pending: Vec::new(),
            out,
        }
    }

    pub async fn run(&mut self, commands: &[ScriptCommand]) -> Result<()> {
        for cmd in commands {
            self.execute(cmd).await?;
        }
        self.settle().await
    }

    pub async fn execute(&mut self, cmd: &ScriptCommand) -> Result<()> {
        debug!(?cmd, "ScriptRunner::execute: called");
        match cmd {
            ScriptCommand::Suspend(linger) => self.pending.push(self.coord.suspend(*linger)),
            ScriptCommand::Resuspend(linger) => self.pending.push(self.coord.resuspend(*linger)),
            ScriptCommand::Resume => self.pending.push(self.coord.resume()),
            ScriptCommand::Wakeup => self.pending.push(self.coord.wakeup()),
            ScriptCommand::Wait => self.coord.wait_for_resumed().await,
            ScriptCommand::Sleep(duration) => tokio::time::sleep(*duration).await,
            ScriptCommand::Settle => self.settle().await?,
            ScriptCommand::Status => {
                let json = serde_json::to_string(&self.coord.snapshot())?;
                writeln!(self.out, "{}", json)?;
            }
        }
        Ok(())
    }

    /// Await every outstanding request; the first failure is reported
    pub async fn settle(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        info!(count = pending.len(), "Settling outstanding requests");
        let mut first_err = None;
        for completion in pending {
            if let Err(e) = completion.await
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }
        match first_err {
            Some(e) => Err(e).context("Transition failed"),
            None => Ok(()),
        }
    }
}
