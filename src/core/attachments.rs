//! Local file attachments.
//!
//! Attachments are a purely local artifact: the transcript shows a reference
//! to the file, its name and size. No bytes are ever sent to the server.

use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::core::message::{AppMessageKind, TranscriptRole};
use crate::core::transcript::{EntryBody, EntryId, Transcript};

pub const MAX_FILES: usize = 5;
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/csv",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentMeta {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub reference: Url,
}

impl AttachmentMeta {
    /// Reads metadata for a local file. The MIME type is guessed from the
    /// extension and is empty when unknown.
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let io_err = |source| AttachmentError::Io {
            path: path.to_path_buf(),
            source,
        };
        let absolute = std::fs::canonicalize(path).map_err(io_err)?;
        let metadata = std::fs::metadata(&absolute).map_err(io_err)?;
        if !metadata.is_file() {
            return Err(AttachmentError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let reference =
            Url::from_file_path(&absolute).map_err(|()| AttachmentError::Reference {
                path: absolute.clone(),
            })?;
        let name = absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| absolute.display().to_string());
        let mime_type = mime_guess::from_path(&absolute)
            .first_raw()
            .unwrap_or("")
            .to_string();

        Ok(Self {
            name,
            size: metadata.len(),
            mime_type,
            reference,
        })
    }

    pub fn size_label(&self) -> String {
        format_file_size(self.size)
    }
}

#[derive(Debug)]
pub enum AttachmentError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    NotAFile {
        path: PathBuf,
    },
    /// The path could not be expressed as a `file://` URL.
    Reference {
        path: PathBuf,
    },
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentError::Io { path, source } => {
                write!(f, "Cannot read \"{}\": {}", path.display(), source)
            }
            AttachmentError::NotAFile { path } => {
                write!(f, "\"{}\" is not a regular file", path.display())
            }
            AttachmentError::Reference { path } => {
                write!(f, "Cannot reference \"{}\" as a local file", path.display())
            }
        }
    }
}

impl StdError for AttachmentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AttachmentError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooLarge,
    DisallowedType,
}

pub fn validate(file: &AttachmentMeta) -> Result<(), Rejection> {
    if file.size > MAX_FILE_SIZE {
        return Err(Rejection::TooLarge);
    }
    if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(Rejection::DisallowedType);
    }
    Ok(())
}

fn rejection_notice(file: &AttachmentMeta, rejection: Rejection) -> String {
    match rejection {
        Rejection::TooLarge => format!(
            "File \"{}\" is too large. Maximum size is {}MB",
            file.name,
            MAX_FILE_SIZE / (1024 * 1024)
        ),
        Rejection::DisallowedType => format!("File type \"{}\" is not allowed.", file.mime_type),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachOutcome {
    pub accepted: Vec<EntryId>,
    pub rejected: usize,
    pub batch_rejected: bool,
}

/// Refuses a whole selection of `count` files for exceeding [`MAX_FILES`].
pub fn reject_batch(transcript: &mut Transcript, count: usize) -> AttachOutcome {
    transcript.push_notice(
        AppMessageKind::Error,
        format!("Too many files. Maximum {MAX_FILES} files allowed."),
    );
    AttachOutcome {
        accepted: Vec::new(),
        rejected: count,
        batch_rejected: true,
    }
}

/// Validates a selection and appends one user entry per accepted file.
pub fn attach_files(transcript: &mut Transcript, files: Vec<AttachmentMeta>) -> AttachOutcome {
    if files.len() > MAX_FILES {
        return reject_batch(transcript, files.len());
    }

    let mut outcome = AttachOutcome::default();
    for file in files {
        if let Err(rejection) = validate(&file) {
            debug!(name = %file.name, ?rejection, "Attachment rejected");
            transcript.push_notice(AppMessageKind::Error, rejection_notice(&file, rejection));
            outcome.rejected += 1;
            continue;
        }

        let id = transcript.push(TranscriptRole::User, EntryBody::Attachment(file));
        transcript.scroll_to_end();
        outcome.accepted.push(id);
    }
    outcome
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Binary-unit size with at most two decimals: 1536 -> "1.5 KB".
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor: u64 = 1;
    while unit + 1 < SIZE_UNITS.len() && bytes >= divisor.saturating_mul(1024) {
        divisor *= 1024;
        unit += 1;
    }

    // Half-way cases round up, not to even.
    let value = (bytes as f64 / divisor as f64 * 100.0).round() / 100.0;
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}
