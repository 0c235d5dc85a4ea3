use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::WaitError;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS);

// How often a running command is checked for exit.
const CHILD_POLL_STEP: Duration = Duration::from_millis(10);

/// Built-in conditions the `condwait` binary knows how to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Holds once the path exists.
    FileExists(PathBuf),
    /// Holds once a TCP connection to `host:port` succeeds.
    TcpConnect {
        address: String,
        connect_timeout: Duration,
    },
    /// Holds once the command exits with status 0.
    Command { program: String, args: Vec<String> },
}

impl Probe {
    /// Builds a probe from a kind (`file`, `tcp`, `cmd`) and its target.
    pub fn parse(kind: &str, target: &str, args: &[String]) -> Result<Self, WaitError> {
        match kind {
            "file" => Ok(Probe::FileExists(PathBuf::from(target))),
            "tcp" => Self::tcp(target, DEFAULT_CONNECT_TIMEOUT),
            "cmd" => {
                if target.trim().is_empty() {
                    return Err(WaitError::InvalidProbe(
                        "command probe requires a program".to_string(),
                    ));
                }
                Ok(Probe::Command {
                    program: target.to_string(),
                    args: args.to_vec(),
                })
            }
            other => Err(WaitError::InvalidProbe(format!(
                "unknown probe kind '{other}' (expected file, tcp or cmd)"
            ))),
        }
    }

    pub fn tcp(address: &str, connect_timeout: Duration) -> Result<Self, WaitError> {
        let (host, port) = address.rsplit_once(':').ok_or_else(|| {
            WaitError::InvalidProbe(format!("'{address}' is not in host:port form"))
        })?;
        if host.is_empty() {
            return Err(WaitError::InvalidProbe(format!(
                "'{address}' is missing a host"
            )));
        }
        if port.parse::<u16>().is_err() {
            return Err(WaitError::InvalidProbe(format!(
                "'{port}' is not a valid port"
            )));
        }
        if connect_timeout.is_zero() {
            return Err(WaitError::InvalidProbe(
                "connect timeout must be greater than 0".to_string(),
            ));
        }

        Ok(Probe::TcpConnect {
            address: address.to_string(),
            connect_timeout,
        })
    }

    /// Replaces the connect timeout of a TCP probe; other probes are returned as-is.
    pub fn with_connect_timeout(self, timeout: Duration) -> Result<Self, WaitError> {
        match self {
            Probe::TcpConnect { address, .. } => Self::tcp(&address, timeout),
            other => Ok(other),
        }
    }

    /// Evaluates the probe once, spending at most `budget` on it.
    ///
    /// Only failures that polling cannot fix are errors (e.g. a program that
    /// cannot be spawned). A refused connection, a missing file, or a check
    /// that ran out of budget is `Ok(false)`.
    pub fn check(&self, budget: Duration) -> Result<bool, WaitError> {
        match self {
            Probe::FileExists(path) => Ok(path.exists()),
            Probe::TcpConnect {
                address,
                connect_timeout,
            } => Ok(Self::try_connect(address, *connect_timeout, budget)),
            Probe::Command { program, args } => {
                let child = Command::new(program)
                    .args(args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()?;
                Self::wait_child(child, budget)
            }
        }
    }

    fn wait_child(mut child: Child, budget: Duration) -> Result<bool, WaitError> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status.success());
            }

            let spent = start.elapsed();
            if spent >= budget {
                log::trace!("Command still running after {spent:?}, killing it");
                // The child may exit between try_wait and kill.
                let _ = child.kill();
                child.wait()?;
                return Ok(false);
            }

            std::thread::sleep(CHILD_POLL_STEP.min(budget - spent));
        }
    }

    fn try_connect(address: &str, connect_timeout: Duration, budget: Duration) -> bool {
        let start = Instant::now();
        let addrs = match address.to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                log::trace!("Could not resolve {address}: {e}");
                return false;
            }
        };

        for addr in addrs {
            let remaining = budget.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                log::trace!("Out of budget connecting to {address}");
                return false;
            }

            match TcpStream::connect_timeout(&addr, connect_timeout.min(remaining)) {
                Ok(_) => return true,
                Err(e) => log::trace!("Connection to {addr} failed: {e}"),
            }
        }
        false
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::FileExists(path) => write!(f, "file {} to exist", path.display()),
            Probe::TcpConnect { address, .. } => write!(f, "tcp connection to {address}"),
            Probe::Command { program, args } if args.is_empty() => {
                write!(f, "command `{program}` to succeed")
            }
            Probe::Command { program, args } => {
                write!(f, "command `{program} {}` to succeed", args.join(" "))
            }
        }
    }
}
