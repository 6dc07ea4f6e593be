use crate::error::ExecError;
use crate::streams::{Output, StreamSet};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::Command;

/// Runs the executable at `path` with the given streams attached and waits for it.
///
/// The child sees `name` as its `argv[0]`. Output for buffer streams is
/// collected and copied in once the child exits.
pub fn run(
    path: &Path,
    name: &str,
    args: &[String],
    streams: &mut StreamSet,
) -> Result<(), ExecError> {
    streams.flush()?;

    let child = Command::new(path)
        .arg0(name)
        .args(args)
        .stdin(streams.stdin.to_stdio())
        .stdout(streams.stdout.to_stdio()?)
        .stderr(streams.stderr.to_stdio()?)
        .spawn()
        .map_err(ExecError::Spawn)?;
    log::debug!("spawned {} (pid {})", path.display(), child.id());

    let output = child.wait_with_output()?;
    if let Output::Buffer(buffer) = &streams.stdout {
        buffer.extend_from_slice(&output.stdout);
    }
    if let Output::Buffer(buffer) = &streams.stderr {
        buffer.extend_from_slice(&output.stderr);
    }

    let status = output.status;
    log::debug!("{name} finished with {status}");
    if status.success() {
        Ok(())
    } else if let Some(code) = status.code() {
        Err(ExecError::Exited(code))
    } else if let Some(signal) = status.signal() {
        Err(ExecError::Signaled(signal))
    } else {
        Ok(())
    }
}
