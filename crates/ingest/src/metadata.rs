//! Upload metadata sanitization.
//!
//! User ids and file names end up inside blob keys, so both are stripped of
//! control characters and trimmed. User ids must not contain a `/`; file
//! names are reduced to their final path segment. A missing file name is
//! replaced with a random `{uuid}.jpg`.
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::error::IngestError;

/// User id and file name after sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadMetadata {
    pub user_id: String,
    pub file_name: String,
}

pub(crate) fn normalize_metadata(
    user_id: String,
    file_name: Option<String>,
    cfg: &IngestConfig,
) -> Result<UploadMetadata, IngestError> {
    let user_id = sanitize_user_id(user_id, cfg.strip_control_chars)?;
    let file_name = sanitize_file_name(file_name, cfg.strip_control_chars)
        .unwrap_or_else(generated_file_name);
    Ok(UploadMetadata { user_id, file_name })
}

pub(crate) fn sanitize_user_id(value: String, strip_control: bool) -> Result<String, IngestError> {
    let user_id = sanitize_required_field("user_id", value, strip_control)?;
    if user_id.contains('/') {
        return Err(IngestError::InvalidMetadata(format!(
            "user_id must not contain '/': {user_id}"
        )));
    }
    Ok(user_id)
}

/// Keeps only the last path segment of a caller-supplied file name.
pub(crate) fn sanitize_file_name(value: Option<String>, strip_control: bool) -> Option<String> {
    let cleaned = sanitize_optional_string(value, strip_control)?;
    let base = cleaned
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base)
    }
}

pub(crate) fn generated_file_name() -> String {
    format!("{}.jpg", Uuid::new_v4())
}

/// Strips control characters (optionally) and trims; `None` when nothing is left.
///
/// ```rust,ignore
/// let result = sanitize_optional_string(Some("  Hello\u{0000}World  ".into()), true);
/// assert_eq!(result, Some("HelloWorld".to_string()));
/// assert_eq!(sanitize_optional_string(Some("   ".into()), true), None);
/// ```
pub(crate) fn sanitize_optional_string(
    value: Option<String>,
    strip_control: bool,
) -> Option<String> {
    value.and_then(|raw| {
        let filtered = if strip_control {
            raw.chars().filter(|c| !c.is_control()).collect::<String>()
        } else {
            raw
        };
        let trimmed = filtered.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

/// Like [`sanitize_optional_string`] but an empty result is an error.
pub(crate) fn sanitize_required_field(
    field: &str,
    value: String,
    strip_control: bool,
) -> Result<String, IngestError> {
    sanitize_optional_string(Some(value), strip_control)
        .ok_or_else(|| IngestError::InvalidMetadata(format!("{field} empty")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_chars_stripped_from_user_id() {
        let id = sanitize_user_id("  al\u{0007}ice \n".into(), true).unwrap();
        assert_eq!(id, "alice");
    }

    #[test]
    fn blank_user_id_rejected() {
        let err = sanitize_user_id(" \t ".into(), true).unwrap_err();
        assert_eq!(err, IngestError::InvalidMetadata("user_id empty".into()));
    }

    #[test]
    fn slash_in_user_id_rejected() {
        assert!(matches!(
            sanitize_user_id("a/b".into(), true),
            Err(IngestError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn file_name_reduced_to_basename() {
        assert_eq!(
            sanitize_file_name(Some("../../etc/cat.png".into()), true).as_deref(),
            Some("cat.png")
        );
        assert_eq!(
            sanitize_file_name(Some("C:\\photos\\dog.jpg".into()), true).as_deref(),
            Some("dog.jpg")
        );
        assert_eq!(sanitize_file_name(Some("dir/".into()), true), None);
        assert_eq!(sanitize_file_name(Some("..".into()), true), None);
    }

    #[test]
    fn missing_file_name_generated() {
        let meta = normalize_metadata("bob".into(), Some("   ".into()), &IngestConfig::default())
            .unwrap();
        let stem = meta.file_name.strip_suffix(".jpg").unwrap();
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn control_chars_kept_when_disabled() {
        assert_eq!(
            sanitize_optional_string(Some("a\u{0001}b".into()), false).as_deref(),
            Some("a\u{0001}b")
        );
    }
}
