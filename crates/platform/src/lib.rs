//! Host detection for MongoDB downloads.
//!
//! Maps the running operating system and CPU onto the `target` and `arch`
//! values used by the MongoDB download manifest.

mod arch;
mod consts;
pub mod error;
mod os_release;
mod target;

pub use crate::arch::{infer_arch, infer_arch_from};
use crate::error::{ErrorKind, Result};
pub use crate::os_release::OsRelease;
pub use crate::target::infer_target_from_os_release;
use exn::ResultExt;

const OS_RELEASE: &str = "/etc/os-release";
const OS_RELEASE_FALLBACK: &str = "/usr/lib/os-release";

/// The download target of the running host.
///
/// Windows and macOS have a single target each. Linux hosts are identified
/// through their os-release file.
pub fn infer_target() -> Result<String> {
    if cfg!(windows) {
        return Ok("windows".to_string());
    }
    if cfg!(target_os = "macos") {
        return Ok("macos".to_string());
    }
    let content = match std::fs::read_to_string(OS_RELEASE) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = OS_RELEASE, error = %e, "os-release not readable, trying fallback");
            std::fs::read_to_string(OS_RELEASE_FALLBACK).or_raise(|| ErrorKind::OsRelease(OS_RELEASE_FALLBACK.into()))?
        },
    };
    infer_target_from_os_release(&content)
}
