//! Owner and permission provisioning for merged-tree directories.
//!
//! Directories created in the merged tree are owned by the configured media
//! user and group with mode `0755`. Files are hard links and keep the owner and
//! mode of the source inode, so nothing here touches files.

use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::fs::{lchown, DirBuilderExt, PermissionsExt};
use std::path::Path;

use super::error::{IdentityKind, MergeError, MergeResult};

/// Mode applied to every provisioned directory.
pub const DIRECTORY_MODE: u32 = 0o755;

/// Upper bound for the passwd/group lookup buffer.
const MAX_LOOKUP_BUFFER: usize = 1024 * 1024;

/// Numeric owner applied to provisioned directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ownership {
    pub uid: u32,
    pub gid: u32,
}

impl Ownership {
    /// Create an ownership from raw ids.
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Resolve user and group names through the host databases.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::IdentityNotFound`] if either name is unknown.
    pub fn resolve(user: &str, group: &str) -> MergeResult<Self> {
        let uid = lookup_uid(user).ok_or_else(|| MergeError::IdentityNotFound {
            kind: IdentityKind::User,
            name: user.to_string(),
        })?;
        let gid = lookup_gid(group).ok_or_else(|| MergeError::IdentityNotFound {
            kind: IdentityKind::Group,
            name: group.to_string(),
        })?;

        tracing::debug!(user, group, uid, gid, "Resolved merge ownership");
        Ok(Self { uid, gid })
    }

    /// The effective uid/gid of the running process.
    pub fn current() -> Self {
        // SAFETY: geteuid/getegid cannot fail and touch no memory.
        let (uid, gid) = unsafe { (libc::geteuid(), libc::getegid()) };
        Self { uid, gid }
    }

    /// Make sure `path` exists as a directory owned by this identity with mode `0755`.
    ///
    /// Missing ancestors are created with the same mode (less umask), but only
    /// `path` itself gets the owner applied. Ownership and mode are reapplied
    /// even when the directory already existed, so repeated calls are harmless.
    ///
    /// A symlink at `path` is removed and replaced by a real directory, so
    /// later work never reaches through it into another tree. Any other
    /// non-directory entry is an error.
    pub fn ensure_directory(&self, path: &Path) -> MergeResult<()> {
        let create_failed = |e: io::Error| MergeError::CreateDirFailed {
            path: path.to_path_buf(),
            source: e,
        };

        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(meta) if meta.file_type().is_symlink() => {
                tracing::warn!(path = %path.display(), "Replacing symlink with a directory");
                fs::remove_file(path).map_err(create_failed)?;
                create_directory(path).map_err(create_failed)?;
            }
            Ok(_) => {
                return Err(create_failed(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "path exists and is not a directory",
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                create_directory(path).map_err(create_failed)?;
            }
            Err(e) => return Err(create_failed(e)),
        }

        lchown(path, Some(self.uid), Some(self.gid)).map_err(|e| {
            MergeError::SetOwnershipFailed {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        fs::set_permissions(path, fs::Permissions::from_mode(DIRECTORY_MODE)).map_err(|e| {
            MergeError::SetOwnershipFailed {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        Ok(())
    }
}

fn create_directory(path: &Path) -> io::Result<()> {
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIRECTORY_MODE)
        .create(path)?;
    tracing::debug!(path = %path.display(), "Created directory");
    Ok(())
}

/// Initial buffer size suggested by sysconf, with a sane fallback.
fn initial_buffer_size(name: libc::c_int) -> usize {
    // SAFETY: sysconf only reads a configuration value.
    let suggested = unsafe { libc::sysconf(name) };
    if suggested > 0 {
        suggested as usize
    } else {
        1024
    }
}

fn lookup_uid(user: &str) -> Option<u32> {
    let name = CString::new(user).ok()?;
    let mut buf = vec![0 as libc::c_char; initial_buffer_size(libc::_SC_GETPW_R_SIZE_MAX)];

    loop {
        // SAFETY: passwd is plain old data; getpwnam_r fills it in.
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        // SAFETY: every pointer is valid for the duration of the call and
        // buf.len() matches the buffer handed over.
        let rc = unsafe {
            libc::getpwnam_r(
                name.as_ptr(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if rc == libc::ERANGE && buf.len() < MAX_LOOKUP_BUFFER {
            let grown = buf.len() * 2;
            buf.resize(grown, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        return Some(pwd.pw_uid);
    }
}

fn lookup_gid(group: &str) -> Option<u32> {
    let name = CString::new(group).ok()?;
    let mut buf = vec![0 as libc::c_char; initial_buffer_size(libc::_SC_GETGR_R_SIZE_MAX)];

    loop {
        // SAFETY: group is plain old data; getgrnam_r fills it in.
        let mut grp: libc::group = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::group = std::ptr::null_mut();

        // SAFETY: as in lookup_uid.
        let rc = unsafe {
            libc::getgrnam_r(
                name.as_ptr(),
                &mut grp,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if rc == libc::ERANGE && buf.len() < MAX_LOOKUP_BUFFER {
            let grown = buf.len() * 2;
            buf.resize(grown, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        return Some(grp.gr_gid);
    }
}
