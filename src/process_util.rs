// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Running local subprocesses under a `Context`.
//!
//! A process still running when its context is cancelled or expires is
//! killed, so a stuck `ssh` never outlives the provisioning deadline.

use std::fmt::{self, Write};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use libprovision::context::{Context, ContextError};
use log::debug;

#[cfg(not(test))]
const WAIT_INTERVAL: Duration = Duration::from_millis(100);
#[cfg(test)]
const WAIT_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug)]
pub enum ErrorKind {
    LaunchProcess(io::Error),
    Wait(io::Error),
    ExitedNonZero(Output),
    Killed(ContextError),
}

#[derive(Debug)]
pub struct ProcessError {
    command: String,
    kind: ErrorKind,
}

impl ProcessError {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.kind {
            ErrorKind::LaunchProcess(err) => {
                write!(f, "failed to launch process \"{}\": {}", self.command, err)
            }
            ErrorKind::Wait(err) => {
                write!(f, "failed to wait for \"{}\": {}", self.command, err)
            }
            ErrorKind::ExitedNonZero(output) => write!(
                f,
                "command \"{}\" failed: {}\nstdout={}\nstderr={}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stdout).trim_end(),
                String::from_utf8_lossy(&output.stderr).trim_end(),
            ),
            ErrorKind::Killed(err) => {
                write!(f, "command \"{}\" killed: {}", self.command, err)
            }
        }
    }
}

impl std::error::Error for ProcessError {}

/// Format the command as a string for logging and error messages.
pub fn command_to_string(cmd: &Command) -> String {
    let mut output = cmd.get_program().to_string_lossy().into_owned();

    for arg in cmd.get_args() {
        // OK to unwrap: writing into a string cannot fail.
        write!(output, " {}", arg.to_string_lossy()).unwrap();
    }

    output
}

fn read_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            // A read error only loses output; the exit status still counts.
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Wait for `child`, killing it if `ctx` is done first.
fn wait_child(ctx: &Context, child: &mut Child) -> Result<ExitStatus, ErrorKind> {
    loop {
        if let Some(status) = child.try_wait().map_err(ErrorKind::Wait)? {
            return Ok(status);
        }
        if let Err(err) = ctx.sleep(WAIT_INTERVAL) {
            // The process may exit on its own in the meantime; either way
            // it is gone afterwards.
            let _ = child.kill();
            let _ = child.wait();
            return Err(ErrorKind::Killed(err));
        }
    }
}

/// Spawn `command` and collect its output.
///
/// A non-zero exit is not an error here; callers that care use
/// `check_output`.
pub fn run_with_context(ctx: &Context, mut command: Command) -> Result<Output, ProcessError> {
    let cmd_str = command_to_string(&command);
    debug!("running command: {}", cmd_str);

    command.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = command.spawn().map_err(|err| ProcessError {
        command: cmd_str.clone(),
        kind: ErrorKind::LaunchProcess(err),
    })?;
    let stdout = read_pipe(child.stdout.take());
    let stderr = read_pipe(child.stderr.take());

    let status = wait_child(ctx, &mut child).map_err(|kind| ProcessError {
        command: cmd_str.clone(),
        kind,
    })?;
    Ok(Output {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

/// Turn a non-zero exit of the command described by `command` into an error.
pub fn check_output(command: String, output: Output) -> Result<Output, ProcessError> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(ProcessError {
            command,
            kind: ErrorKind::ExitedNonZero(output),
        })
    }
}

/// Run `command` and get its stdout as a `String`.
///
/// An error is returned if the process fails to launch, exits non-zero or is
/// killed, or if the output is not valid utf8.
pub fn get_output_as_string(ctx: &Context, command: Command) -> anyhow::Result<String> {
    let cmd_str = command_to_string(&command);
    let output = check_output(cmd_str, run_with_context(ctx, command)?)?;
    Ok(String::from_utf8(output.stdout)?)
}

/// Run `producer | consumer`, failing if either side fails.
pub fn run_piped(
    ctx: &Context,
    mut producer: Command,
    mut consumer: Command,
) -> Result<(), ProcessError> {
    let producer_str = command_to_string(&producer);
    let consumer_str = command_to_string(&consumer);
    debug!("running pipeline: {} | {}", producer_str, consumer_str);

    producer.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut source = producer.spawn().map_err(|err| ProcessError {
        command: producer_str.clone(),
        kind: ErrorKind::LaunchProcess(err),
    })?;
    let source_stderr = read_pipe(source.stderr.take());
    if let Some(stdout) = source.stdout.take() {
        consumer.stdin(Stdio::from(stdout));
    }

    let sink_result =
        run_with_context(ctx, consumer).and_then(|output| check_output(consumer_str, output));
    if sink_result.is_err() {
        // Nothing reads the producer's output any more.
        let _ = source.kill();
    }
    let source_status = wait_child(ctx, &mut source);
    let source_stderr = source_stderr.join().unwrap_or_default();

    sink_result?;
    match source_status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(ProcessError {
            command: producer_str,
            kind: ErrorKind::ExitedNonZero(Output {
                status,
                stdout: Vec::new(),
                stderr: source_stderr,
            }),
        }),
        Err(kind) => Err(ProcessError {
            command: producer_str,
            kind,
        }),
    }
}
