//! Upload-and-folder-resolution workflow.
//!
//! Places a byte stream into a named subfolder of a fixed Drive parent:
//!   1. resolve (or create) the subfolder, re-resolved on every call
//!   2. stage the stream to a local temporary file named after the
//!      destination's extension
//!   3. upload the staged file with a resumable transfer
//!
//! The staged file is owned by a [`tempfile::NamedTempFile`] for the whole
//! call, so it is removed on every exit path: success, a failed upload, or a
//! stream that errors halfway through the copy.
//!
//! Folder resolution is a lookup followed by a create with no lock in
//! between. Two concurrent callers targeting a subfolder that does not exist
//! yet can each create one; callers are expected to be single-threaded.

use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, error, info, Instrument};
use uuid::Uuid;

use crate::config::DriveSettings;
use crate::contract::{DriveClient, DriveError, NewDriveFile};
use crate::drive_query::folder_lookup_query;
use crate::google_drive::GoogleDriveClient;

/// Return the id of the non-trashed folder `name` under `parent_id`,
/// creating it when no such folder exists. The first match wins.
pub async fn ensure_drive_subfolder<C>(
    client: &C,
    parent_id: &str,
    name: &str,
) -> Result<String, DriveError>
where
    C: DriveClient + ?Sized,
{
    let query = folder_lookup_query(name, parent_id);
    debug!(query = %query, "Looking up destination subfolder");

    let matches = client.list_files(&query).await.map_err(|e| {
        error!(error = %e, parent_id, folder = name, "Subfolder lookup failed");
        e
    })?;

    if let Some(existing) = matches.into_iter().next() {
        info!(folder_id = %existing.id, folder = name, "Reusing existing subfolder");
        return Ok(existing.id);
    }

    let created = client
        .create_folder(&NewDriveFile::folder(name, parent_id))
        .await
        .map_err(|e| {
            error!(error = %e, parent_id, folder = name, "Subfolder creation failed");
            e
        })?;
    info!(folder_id = %created.id, folder = name, parent_id, "Created subfolder");
    Ok(created.id)
}

/// Upload `stream` as `file_name` into the configured subfolder and return
/// the new Drive file id.
///
/// Every failure is returned as an `Err` after the staged file has been
/// removed; there is no sentinel return for failure.
pub async fn upload_to_drive<C, R>(
    client: &C,
    settings: &DriveSettings,
    file_name: &str,
    stream: &mut R,
) -> Result<String, DriveError>
where
    C: DriveClient + ?Sized,
    R: Read + ?Sized,
{
    let span = tracing::info_span!("upload", upload_id = %Uuid::new_v4(), file_name);
    async move {
        let folder_id =
            ensure_drive_subfolder(client, &settings.parent_folder_id, &settings.subfolder)
                .await?;

        let staged = stage_stream(file_name, stream, settings.staging_dir.as_deref())?;
        debug!(path = %staged.path().display(), "Staged upload payload");

        let metadata = NewDriveFile::file(file_name, &folder_id);
        let uploaded = match client.upload_file(staged.path(), &metadata).await {
            Ok(file) => file,
            Err(e) => {
                error!(error = %e, folder_id = %folder_id, "Upload failed");
                return Err(e);
            }
        };

        info!(file_id = %uploaded.id, folder_id = %folder_id, "Upload complete");
        Ok(uploaded.id)
    }
    .instrument(span)
    .await
}

/// Authenticate with the service-account key in `settings` and upload.
pub async fn upload_via_service_account<R>(
    settings: &DriveSettings,
    file_name: &str,
    stream: &mut R,
) -> Result<String, DriveError>
where
    R: Read + ?Sized,
{
    let client = GoogleDriveClient::connect(&settings.credentials_file).await?;
    upload_to_drive(&client, settings, file_name, stream).await
}

/// Copy the whole stream into a temp file whose suffix matches the
/// destination name's extension.
fn stage_stream<R>(
    file_name: &str,
    stream: &mut R,
    staging_dir: Option<&Path>,
) -> Result<NamedTempFile, DriveError>
where
    R: Read + ?Sized,
{
    let suffix = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let mut builder = tempfile::Builder::new();
    builder.prefix("clip-upload-").suffix(&suffix);
    let mut staged = match staging_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    let copied = std::io::copy(stream, &mut staged).map_err(|e| {
        error!(
            error = ?e,
            path = %staged.path().display(),
            "Failed to copy stream to staging file"
        );
        e
    })?;
    staged.flush()?;
    debug!(bytes = copied, "Copied stream to staging file");
    Ok(staged)
}
