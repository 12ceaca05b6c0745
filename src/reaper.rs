//! Reclaiming finished background children.

use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// Collect every child that has already terminated, without blocking.
///
/// Returns how many children were reclaimed. Children that are still running
/// are left alone; with no children at all this is a no-op.
pub fn reap_zombies() -> usize {
    // -1: any child of this process.
    let any_child = Pid::from_raw(-1);
    let mut reaped = 0;
    loop {
        match wait::waitpid(any_child, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Ok(status) => {
                tracing::debug!(?status, "reaped background child");
                reaped += 1;
            }
            Err(Errno::EINTR) => continue,
            Err(err) => {
                tracing::warn!(%err, "waitpid failed while reaping");
                break;
            }
        }
    }
    reaped
}
