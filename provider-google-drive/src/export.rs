//! Google Workspace export formats
//!
//! Docs, Sheets and the other Workspace types have no binary content of
//! their own; Drive converts them on `files/{id}/export`.

const WORKSPACE_PREFIX: &str = "application/vnd.google-apps.";

/// Target format for exporting a Workspace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    pub mime_type: &'static str,
    /// Appended to the file name, dot included.
    pub extension: &'static str,
}

const PDF: ExportFormat = ExportFormat {
    mime_type: "application/pdf",
    extension: ".pdf",
};

/// True for Workspace types that must be exported rather than downloaded.
/// Folders and shortcuts have nothing to export.
pub fn is_workspace_file(mime_type: &str) -> bool {
    match mime_type.strip_prefix(WORKSPACE_PREFIX) {
        Some(kind) => !matches!(kind, "folder" | "shortcut"),
        None => false,
    }
}

/// Export format for a Workspace MIME type; unlisted types export as PDF.
pub fn export_format(mime_type: &str) -> ExportFormat {
    let kind = mime_type.strip_prefix(WORKSPACE_PREFIX).unwrap_or_default();
    match kind {
        "document" => ExportFormat {
            mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            extension: ".docx",
        },
        "spreadsheet" => ExportFormat {
            mime_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            extension: ".xlsx",
        },
        "presentation" => ExportFormat {
            mime_type: "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            extension: ".pptx",
        },
        "drawing" => ExportFormat {
            mime_type: "image/png",
            extension: ".png",
        },
        "form" => ExportFormat {
            mime_type: "application/zip",
            extension: ".zip",
        },
        "script" => ExportFormat {
            mime_type: "application/vnd.google-apps.script+json",
            extension: ".json",
        },
        _ => PDF,
    }
}
