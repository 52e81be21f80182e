use crate::oracle::Oracle;
use log::{debug, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

pub const REQUEST_FILE: &str = "bcp_trigger_input.txt";
pub const RESPONSE_FILE: &str = "bcp_output.txt";

/// How requests and responses travel to and from the external program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exchange {
    /// Request on stdin, response on stdout.
    Pipe,
    /// Request in [`REQUEST_FILE`], response in [`RESPONSE_FILE`], both inside `dir`. The program
    /// runs with `dir` as its working directory.
    Files { dir: PathBuf },
}

/// Oracle that runs an external propagation engine once per trigger.
#[derive(Clone, Debug)]
pub struct CommandOracle {
    program: String,
    args: Vec<String>,
    exchange: Exchange,
}

impl CommandOracle {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            exchange: Exchange::Pipe,
        }
    }

    /// Splits a command line on whitespace. `None` when it is blank.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let program = words.next()?;
        Some(Self::new(program, words))
    }

    pub fn with_exchange_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.exchange = Exchange::Files {
            dir: dir.as_ref().to_path_buf(),
        };
        self
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    fn run_piped(&self, request: &str) -> io::Result<String> {
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        // stdin is closed at the end of the match, before waiting
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(request.as_bytes()),
            None => Ok(()),
        };
        let output = child.wait_with_output()?;
        check_status(&self.program, output.status)?;
        written?;
        String::from_utf8(output.stdout).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn run_with_files(&self, dir: &Path, request: &str) -> io::Result<String> {
        let request_path = dir.join(REQUEST_FILE);
        let response_path = dir.join(RESPONSE_FILE);

        fs::write(&request_path, request)?;
        match fs::remove_file(&response_path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }

        let status = self.command().current_dir(dir).status()?;
        check_status(&self.program, status)?;

        match fs::read_to_string(&response_path) {
            Ok(response) => Ok(response),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("{} did not write {}", self.program, response_path.display());
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }
}

fn check_status(program: &str, status: ExitStatus) -> io::Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("oracle {} exited with {}", program, status),
        ))
    }
}

impl Oracle for CommandOracle {
    fn run(&mut self, request: &str) -> io::Result<String> {
        debug!("running oracle {} {:?}", self.program, self.args);
        match &self.exchange {
            Exchange::Pipe => self.run_piped(request),
            Exchange::Files { dir } => self.run_with_files(dir, request),
        }
    }
}
