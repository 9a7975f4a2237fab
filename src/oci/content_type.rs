//! Extension-based content type lookup for uploaded objects

use std::path::Path;

/// Fallback when the extension is missing or unknown
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Resolve the MIME type for an object name from its extension.
pub fn content_type_for(object_name: &str) -> &'static str {
    let extension = match Path::new(object_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return DEFAULT_CONTENT_TYPE,
    };

    match extension.as_str() {
        "txt" => "text/plain",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "zip" => "application/zip",
        "csv" => "text/csv",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
