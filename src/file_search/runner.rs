use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

/// What a finished search process produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when terminated by a signal.
    pub status: Option<i32>,
    /// Standard output followed by standard error, as raw bytes. Paths are
    /// not required to be UTF-8.
    pub combined: Vec<u8>,
}

/// Runs a program to completion and captures its output.
///
/// An `Err` means the process could not be started. A process that ran and
/// exited non-zero is still `Ok`.
pub trait ProcessRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<ProcessOutput>;
}

/// `std::process::Command` runner. Blocks until the child exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRunner;

impl ProcessRunner for CommandRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        debug!(
            program = %program.display(),
            status = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Search process exited"
        );

        let mut combined = output.stdout;
        if !output.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with(b"\n") {
                combined.push(b'\n');
            }
            combined.extend_from_slice(&output.stderr);
        }

        Ok(ProcessOutput {
            status: output.status.code(),
            combined,
        })
    }
}

/// Resolve a bare program name through `PATH`.
///
/// Paths and names `which` cannot find are returned unchanged; spawning them
/// reports the failure.
pub fn resolve_program(program: &str) -> PathBuf {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    match which::which(program) {
        Ok(path) => path,
        Err(e) => {
            debug!(program = program, error = %e, "Program not found on PATH");
            candidate.to_path_buf()
        }
    }
}
