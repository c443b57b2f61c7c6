//! Repository-related utilities.
//!
//! This module contains functions shared by the conversion record repositories:
//! unique sharded-directory allocation and traversal of the sharded layout.

use crate::error::{ConversionError, ConversionResult};
use bridge_uuid::RecordUuid;
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

/// Creates a unique sharded record directory within the base directory.
///
/// This function generates identifiers using the provided source function and attempts
/// to create a corresponding sharded directory. It guards against identifier collisions
/// or pre-existing directories by retrying up to 5 times with different identifiers.
///
/// # Arguments
///
/// * `base_dir` - The base records directory.
/// * `id_source` - A mutable closure that generates new `RecordUuid` values.
///
/// # Returns
///
/// Returns a tuple of the allocated `RecordUuid` and the `PathBuf` to the created
/// directory.
///
/// # Errors
///
/// Returns a `ConversionError::RecordDirCreation` if:
/// - directory creation fails after 5 attempts,
/// - parent directory creation fails.
pub(crate) fn create_unique_record_dir(
    base_dir: &Path,
    mut id_source: impl FnMut() -> RecordUuid,
) -> ConversionResult<(RecordUuid, PathBuf)> {
    // Allocate a new id, but guard against pathological UUID collisions (or pre-existing
    // directories from external interference) by limiting retries.
    for _attempt in 0..5 {
        let id = id_source();
        let candidate = id.sharded_dir(base_dir);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(ConversionError::RecordDirCreation)?;
        }

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok((id, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(ConversionError::RecordDirCreation(e)),
        }
    }

    Err(ConversionError::RecordDirCreation(io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to allocate a unique record directory after 5 attempts",
    )))
}

/// Collects every record leaf directory under the sharded base directory.
///
/// Expects the layout `<base_dir>/<s1>/<s2>/<32hex-uuid>/`. A missing base directory
/// yields an empty list; unreadable intermediate directories are skipped.
pub(crate) fn record_dirs(base_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    let s1_iter = match fs::read_dir(base_dir) {
        Ok(it) => it,
        Err(_) => return dirs,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for id_ent in id_iter.flatten() {
                let id_path = id_ent.path();
                if id_path.is_dir() {
                    dirs.push(id_path);
                }
            }
        }
    }

    dirs
}
