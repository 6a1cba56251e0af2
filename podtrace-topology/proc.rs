use std::path::Path;

/// Default procfs root. Remapped (e.g. to `/host/proc`) when the agent runs in
/// a container with the host's procfs bind-mounted.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Possible errors from resolving a PID namespace.
#[derive(thiserror::Error, Debug)]
pub enum ProcError {
    /// The `/proc/<pid>` entry is gone; the process already exited.
    #[error("no proc entry for pid {0}")]
    NotFound(u32),

    /// The namespace link exists but its target has an unexpected shape.
    #[error("malformed pid namespace link for pid {0}: '{1}'")]
    Malformed(u32, String),

    /// Any other failure reading the link.
    #[error("cannot read pid namespace link: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves a host PID to its kernel PID-namespace inode by reading the
/// `<proc_root>/<pid>/ns/pid` symbolic link, whose target has the textual form
/// `pid:[<inode>]`. Uncached; repeated calls for the same live PID return the
/// same value.
pub fn pid_namespace(proc_root: &Path, pid: u32) -> Result<u64, ProcError> {
    let link = proc_root.join(pid.to_string()).join("ns").join("pid");
    let target = match std::fs::read_link(&link) {
        Ok(target) => target,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Err(ProcError::NotFound(pid)),
        Err(error) => return Err(ProcError::Io(error)),
    };

    let target = target.to_string_lossy();
    parse_ns_link(&target).ok_or_else(|| ProcError::Malformed(pid, target.into_owned()))
}

/// Parses the inode number out of a `pid:[<inode>]` link target.
fn parse_ns_link(target: &str) -> Option<u64> {
    target.strip_prefix("pid:[")?.strip_suffix(']')?.parse().ok()
}

#[cfg(test)]
#[path = "./proc.tests.rs"]
mod tests;
