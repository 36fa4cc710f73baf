use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;

#[derive(Debug, thiserror::Error)]
pub enum KubectlError {
    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} {subcommand} failed ({status}): {stderr}")]
    Failed {
        program: String,
        subcommand: String,
        status: String,
        stderr: String,
    },
}

/// Something that can execute a `kubectl` argument list and hand back its stdout.
pub trait Runner {
    /// How the program is shown when an invocation is echoed.
    fn program(&self) -> String;

    fn run(&mut self, args: &[String]) -> Result<Vec<u8>, KubectlError>;
}

/// Runs a real `kubectl` binary, one blocking process per call.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: PathBuf,
}

impl Kubectl {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn subcommand(args: &[String]) -> String {
    args.iter()
        .take(2)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Runner for Kubectl {
    fn program(&self) -> String {
        self.program.display().to_string()
    }

    fn run(&mut self, args: &[String]) -> Result<Vec<u8>, KubectlError> {
        let program = self.program();
        debug!("spawning {} {}", program, subcommand(args));
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| KubectlError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(KubectlError::Failed {
                program,
                subcommand: subcommand(args),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Accepts every invocation without running anything.
#[derive(Debug, Clone)]
pub struct DryRun {
    program: PathBuf,
}

impl DryRun {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Runner for DryRun {
    fn program(&self) -> String {
        self.program.display().to_string()
    }

    fn run(&mut self, _args: &[String]) -> Result<Vec<u8>, KubectlError> {
        Ok(Vec::new())
    }
}
