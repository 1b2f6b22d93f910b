//! # Type/MIME Classifier
//!
//! Produces the human-facing type label shown next to each document
//! ("PDF", "Google Doc", "Image", ...).
//!
//! Hints are consulted in a fixed order: a Drive MIME type, then a Dropbox
//! path extension, then a local MIME `type`, then the file name extension.
//! The first hint that yields a label wins. The function is pure and always
//! returns a label, `"Unknown"` when nothing usable is present.

/// Whatever type information a record carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeHints<'a> {
    /// `mimeType` of a Drive file
    pub drive_mime: Option<&'a str>,
    /// `path_lower` of a Dropbox file
    pub dropbox_path: Option<&'a str>,
    /// `type` of a local document
    pub local_type: Option<&'a str>,
    pub file_name: Option<&'a str>,
}

const UNKNOWN: &str = "Unknown";
const WORKSPACE_PREFIX: &str = "application/vnd.google-apps.";

/// Classify a record from its hints.
///
/// ```
/// use core_library::classifier::{classify, TypeHints};
///
/// let hints = TypeHints {
///     drive_mime: Some("application/vnd.google-apps.spreadsheet"),
///     ..Default::default()
/// };
/// assert_eq!(classify(&hints), "Google Sheet");
/// ```
pub fn classify(hints: &TypeHints<'_>) -> String {
    if let Some(label) = non_empty(hints.drive_mime).and_then(classify_drive_mime) {
        return label;
    }

    if let Some(ext) = non_empty(hints.dropbox_path).and_then(extension_of) {
        return ext.to_uppercase();
    }

    if let Some(mime) = non_empty(hints.local_type) {
        return classify_local_mime(mime);
    }

    non_empty(hints.file_name)
        .and_then(extension_of)
        .map(|ext| ext.to_uppercase())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Friendly name of a Google Workspace MIME type.
pub fn workspace_label(mime: &str) -> Option<&'static str> {
    let kind = mime.strip_prefix(WORKSPACE_PREFIX)?;
    let label = match kind {
        "document" => "Google Doc",
        "spreadsheet" => "Google Sheet",
        "presentation" => "Google Slides",
        "form" => "Google Form",
        "drawing" => "Google Drawing",
        "folder" => "Folder",
        "script" => "Apps Script",
        _ => return None,
    };
    Some(label)
}

/// Best-guess MIME type for a file name, used when persisting downloads.
///
/// ```
/// use core_library::classifier::mime_from_file_name;
///
/// assert_eq!(mime_from_file_name("Q1 Report.PDF"), "application/pdf");
/// assert_eq!(mime_from_file_name("notes"), "application/octet-stream");
/// ```
pub fn mime_from_file_name(name: &str) -> &'static str {
    let Some(ext) = extension_of(name) else {
        return "application/octet-stream";
    };

    match ext.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// `None` for Workspace types without a friendly name (shortcuts, maps,
/// sites), which defer to the remaining hints.
fn classify_drive_mime(mime: &str) -> Option<String> {
    if mime.starts_with(WORKSPACE_PREFIX) {
        return workspace_label(mime).map(str::to_string);
    }
    if let Some(label) = common_label(mime) {
        return Some(label.to_string());
    }

    let subtype = subtype_of(mime);
    let stripped = ["vnd.", "x-", "ms-"]
        .iter()
        .find_map(|prefix| subtype.strip_prefix(prefix))
        .unwrap_or(subtype);

    Some(capitalize(stripped).unwrap_or_else(|| UNKNOWN.to_string()))
}

fn classify_local_mime(mime: &str) -> String {
    if let Some(label) = common_label(mime) {
        return label.to_string();
    }

    let subtype = subtype_of(mime);
    if subtype.is_empty() {
        UNKNOWN.to_string()
    } else {
        subtype.to_uppercase()
    }
}

fn common_label(mime: &str) -> Option<&'static str> {
    match mime {
        "application/pdf" => Some("PDF"),
        "text/plain" => Some("Text"),
        _ if mime.starts_with("image/") => Some("Image"),
        _ if mime.starts_with("video/") => Some("Video"),
        _ if mime.starts_with("audio/") => Some("Audio"),
        _ => None,
    }
}

fn subtype_of(mime: &str) -> &str {
    mime.split_once('/').map_or(mime, |(_, subtype)| subtype)
}

fn capitalize(value: &str) -> Option<String> {
    let mut chars = value.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Extension of the last path component, without the dot.
fn extension_of(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(mime: &str) -> String {
        classify(&TypeHints {
            drive_mime: Some(mime),
            ..Default::default()
        })
    }

    #[test]
    fn test_workspace_types() {
        assert_eq!(drive("application/vnd.google-apps.document"), "Google Doc");
        assert_eq!(drive("application/vnd.google-apps.spreadsheet"), "Google Sheet");
        assert_eq!(drive("application/vnd.google-apps.presentation"), "Google Slides");
        assert_eq!(drive("application/vnd.google-apps.form"), "Google Form");
        assert_eq!(drive("application/vnd.google-apps.drawing"), "Google Drawing");
        assert_eq!(drive("application/vnd.google-apps.folder"), "Folder");
        assert_eq!(drive("application/vnd.google-apps.script"), "Apps Script");
    }

    #[test]
    fn test_unlabelled_workspace_type_defers_to_file_name() {
        let hints = TypeHints {
            drive_mime: Some("application/vnd.google-apps.shortcut"),
            file_name: Some("Budget.pdf"),
            ..Default::default()
        };
        assert_eq!(classify(&hints), "PDF");
        assert_eq!(drive("application/vnd.google-apps.site"), "Unknown");
    }

    #[test]
    fn test_drive_common_and_fallback_types() {
        assert_eq!(drive("application/pdf"), "PDF");
        assert_eq!(drive("text/plain"), "Text");
        assert_eq!(drive("image/jpeg"), "Image");
        assert_eq!(drive("video/mp4"), "Video");
        assert_eq!(drive("audio/ogg"), "Audio");
        assert_eq!(drive("application/x-tar"), "Tar");
        assert_eq!(drive("application/vnd.ms-excel"), "Ms-excel");
        assert_eq!(drive("application/zip"), "Zip");
    }

    #[test]
    fn test_dropbox_path_extension() {
        let hints = TypeHints {
            dropbox_path: Some("/reports/q1.final.docx"),
            ..Default::default()
        };
        assert_eq!(classify(&hints), "DOCX");
    }

    #[test]
    fn test_dropbox_path_without_extension_falls_through() {
        let hints = TypeHints {
            dropbox_path: Some("/v1.2/readme"),
            file_name: Some("readme.md"),
            ..Default::default()
        };
        assert_eq!(classify(&hints), "MD");
    }

    #[test]
    fn test_local_type() {
        let local = |mime| {
            classify(&TypeHints {
                local_type: Some(mime),
                ..Default::default()
            })
        };
        assert_eq!(local("application/pdf"), "PDF");
        assert_eq!(local("image/png"), "Image");
        assert_eq!(local("application/json"), "JSON");
        assert_eq!(local("text/csv"), "CSV");
    }

    #[test]
    fn test_drive_hint_takes_precedence() {
        let hints = TypeHints {
            drive_mime: Some("application/pdf"),
            dropbox_path: Some("/x.docx"),
            local_type: Some("text/csv"),
            file_name: Some("x.txt"),
        };
        assert_eq!(classify(&hints), "PDF");
    }

    #[test]
    fn test_file_name_fallback() {
        let by_name = |name| {
            classify(&TypeHints {
                file_name: Some(name),
                ..Default::default()
            })
        };
        assert_eq!(by_name("budget.xlsx"), "XLSX");
        assert_eq!(by_name("Makefile"), "Unknown");
        assert_eq!(by_name("trailing."), "Unknown");
        assert_eq!(classify(&TypeHints::default()), "Unknown");
    }

    #[test]
    fn test_mime_from_file_name() {
        assert_eq!(mime_from_file_name("a.docx"), "application/vnd.openxmlformats-officedocument.wordprocessingml.document");
        assert_eq!(mime_from_file_name("photo.JPG"), "image/jpeg");
        assert_eq!(mime_from_file_name("archive.unknownext"), "application/octet-stream");
    }
}
