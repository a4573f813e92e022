//! One attempt of an external command, captured so failures can be classified.

use again_core::retry::Classify;
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};

/// Output of one attempt, replayed once the retry loop is done.
#[derive(Debug, Default)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CapturedOutput {
    pub fn replay_to<O: Write, E: Write>(&self, out: &mut O, err: &mut E) -> io::Result<()> {
        out.write_all(&self.stdout)?;
        out.flush()?;
        err.write_all(&self.stderr)?;
        err.flush()
    }
}

/// Why one attempt failed.
#[derive(Debug)]
pub enum CommandError {
    /// The program could not be started (not found, not executable, ...).
    Spawn { program: String, source: io::Error },
    /// The program ran and exited non-zero. `stderr` is its last non-empty line.
    Exited {
        code: i32,
        stderr: String,
        output: CapturedOutput,
    },
    /// The program was killed by a signal.
    Signaled {
        signal: Option<i32>,
        stderr: String,
        output: CapturedOutput,
    },
}

impl CommandError {
    /// Exit code for `again` when this error is propagated.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Exited { code, .. } => *code,
            CommandError::Signaled {
                signal: Some(sig), ..
            } => 128 + sig,
            CommandError::Signaled { signal: None, .. } | CommandError::Spawn { .. } => 1,
        }
    }

    /// Everything the failed attempt wrote, if it ran at all.
    pub fn output(&self) -> Option<&CapturedOutput> {
        match self {
            CommandError::Exited { output, .. } | CommandError::Signaled { output, .. } => {
                Some(output)
            }
            CommandError::Spawn { .. } => None,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Spawn { program, source } => {
                write!(f, "failed to start {}: {}", program, source)
            }
            CommandError::Exited { stderr, .. } | CommandError::Signaled { stderr, .. }
                if !stderr.is_empty() =>
            {
                f.write_str(stderr)
            }
            CommandError::Exited { code, .. } => write!(f, "exit code {}", code),
            CommandError::Signaled { .. } => f.write_str("killed by signal"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Spawn { source, .. } => Some(source),
            CommandError::Exited { .. } | CommandError::Signaled { .. } => None,
        }
    }
}

/// Key is what the command said last on stderr; status text only when it said nothing.
impl Classify for CommandError {
    fn classification_key(&self) -> Cow<'_, str> {
        match self {
            CommandError::Exited { stderr, .. } | CommandError::Signaled { stderr, .. }
                if !stderr.is_empty() =>
            {
                Cow::Borrowed(stderr.as_str())
            }
            CommandError::Exited { code, .. } => Cow::Owned(format!("exit code {}", code)),
            CommandError::Signaled { .. } => Cow::Borrowed("killed by signal"),
            CommandError::Spawn { source, .. } => Cow::Owned(source.to_string()),
        }
    }
}

fn last_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Run `program args...` once with stdin closed and output captured.
pub fn run_once(program: &str, args: &[String]) -> Result<CapturedOutput, CommandError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(CapturedOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        });
    }

    tracing::debug!(
        "{} failed ({}); stderr: {}",
        program,
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = last_line(&output.stderr);
    let captured = CapturedOutput {
        stdout: output.stdout,
        stderr: output.stderr,
    };
    Err(match output.status.code() {
        Some(code) => CommandError::Exited {
            code,
            stderr,
            output: captured,
        },
        None => CommandError::Signaled {
            signal: signal_of(&output.status),
            stderr,
            output: captured,
        },
    })
}
