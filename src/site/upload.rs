//! Storage for PMB photo uploads.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use actix_multipart::Field;
use actix_web::web;
use futures_util::StreamExt;
use tempfile::Builder;

use crate::error::UploadError;

/// Reduces a client-supplied filename to a safe basename.
///
/// Non-ASCII characters are dropped, path separators become spaces,
/// whitespace runs collapse to `_`, anything outside `[A-Za-z0-9_.-]` is
/// removed and leading/trailing `.`/`_` are stripped. May return an empty
/// string, which callers treat as "no file".
pub fn sanitize_filename(raw: &str) -> String {
    let ascii: String = raw
        .chars()
        .filter(char::is_ascii)
        .map(|ch| if ch == '/' || ch == '\\' { ' ' } else { ch })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|ch| ch == '.' || ch == '_').to_string()
}

/// Streams `field` into `dir/filename`.
///
/// Data lands in a temporary file next to the target and is renamed into
/// place once complete. An existing file with the same name is replaced.
pub async fn save_field(
    dir: &Path,
    filename: &str,
    mut field: Field,
) -> Result<PathBuf, UploadError> {
    let dir_for_create = dir.to_path_buf();
    web::block(move || fs::create_dir_all(&dir_for_create))
        .await
        .map_err(|err| UploadError::Stream(err.to_string()))?
        .map_err(UploadError::CreateDir)?;

    let dir_for_temp = dir.to_path_buf();
    let mut file = web::block(move || {
        Builder::new()
            .prefix(".upload-")
            .tempfile_in(&dir_for_temp)
    })
    .await
    .map_err(|err| UploadError::Stream(err.to_string()))?
    .map_err(UploadError::Write)?;

    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|err| UploadError::Stream(err.to_string()))?;
        file = web::block(move || file.write_all(&data).map(|_| file))
            .await
            .map_err(|err| UploadError::Stream(err.to_string()))?
            .map_err(UploadError::Write)?;
    }

    let target = dir.join(filename);
    let target_for_persist = target.clone();
    web::block(move || file.persist(&target_for_persist))
        .await
        .map_err(|err| UploadError::Stream(err.to_string()))??;

    Ok(target)
}

/// Consumes the rest of a field without storing it.
pub async fn drain(field: &mut Field) {
    while let Some(chunk) = field.next().await {
        if chunk.is_err() {
            break;
        }
    }
}
