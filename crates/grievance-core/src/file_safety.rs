//! Upload screening for grievance attachments.
//!
//! Checks run in order: size cap, blocked extension, executable magic bytes,
//! then the detected content type against the configured allow-list.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Magic byte signatures for executable files
pub const MAGIC_SIGNATURES: &[(&str, &[u8])] = &[
    ("Windows PE/MZ", &[0x4D, 0x5A]),
    ("ELF", &[0x7F, 0x45, 0x4C, 0x46]),
    ("Mach-O 32", &[0xFE, 0xED, 0xFA, 0xCE]),
    ("Mach-O 64", &[0xFE, 0xED, 0xFA, 0xCF]),
    ("Java class / Mach-O fat", &[0xCA, 0xFE, 0xBA, 0xBE]),
    ("WebAssembly", &[0x00, 0x61, 0x73, 0x6D]),
];

/// Blocked file extensions (case-insensitive)
static BLOCKED_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "exe", "dll", "scr", "pif", "com", "msi", "bat", "cmd", "ps1", "vbs", "js", "jar",
        "class", "so", "dylib", "apk", "app", "dmg", "deb", "rpm", "lnk", "hta", "reg",
        "docm", "xlsm", "pptm",
    ]
    .into_iter()
    .collect()
});

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    TooLarge { limit: u64 },
    BlockedExtension(String),
    Executable(String),
    DisallowedType(String),
}

impl UploadRejection {
    pub fn message(&self) -> String {
        match self {
            UploadRejection::TooLarge { limit } => {
                format!("File exceeds maximum size of {} bytes", limit)
            }
            UploadRejection::BlockedExtension(ext) => {
                format!("File extension .{} is not allowed", ext)
            }
            UploadRejection::Executable(kind) => format!("Executable file detected: {}", kind),
            UploadRejection::DisallowedType(mime) => {
                format!("Content type {} is not allowed", mime)
            }
        }
    }
}

/// An upload that passed screening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenedUpload {
    pub filename: String,
    pub content_type: String,
}

/// Screen an upload. `claimed` is the multipart part's content type, if any.
pub fn screen_upload(
    filename: &str,
    data: &[u8],
    claimed: Option<&str>,
    max_size_bytes: u64,
    allowed_types: &[String],
) -> Result<ScreenedUpload, UploadRejection> {
    if data.len() as u64 > max_size_bytes {
        return Err(UploadRejection::TooLarge {
            limit: max_size_bytes,
        });
    }

    let filename = sanitize_filename(filename);
    if let Some(ext) = extension(&filename) {
        if BLOCKED_EXTENSIONS.contains(ext.as_str()) {
            return Err(UploadRejection::BlockedExtension(ext));
        }
    }

    for (name, magic) in MAGIC_SIGNATURES {
        if data.starts_with(magic) {
            return Err(UploadRejection::Executable(name.to_string()));
        }
    }

    let content_type = detect_content_type(&filename, data, claimed.unwrap_or_default());
    let allowed = allowed_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&content_type));
    if !allowed {
        return Err(UploadRejection::DisallowedType(content_type));
    }

    Ok(ScreenedUpload {
        filename,
        content_type,
    })
}

/// Detect the content type from magic bytes, then extension, then the claim.
///
/// A binary claim (image, audio, video, pdf) that the bytes do not back up is
/// downgraded to `application/octet-stream`.
pub fn detect_content_type(filename: &str, data: &[u8], claimed: &str) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if let Some(mime) = extension(filename).and_then(|ext| mime_from_extension(&ext)) {
        return mime.to_string();
    }

    if claimed.is_empty() || claimed_is_binary(claimed) {
        return "application/octet-stream".to_string();
    }

    claimed.to_string()
}

fn claimed_is_binary(claimed: &str) -> bool {
    claimed.starts_with("image/")
        || claimed.starts_with("audio/")
        || claimed.starts_with("video/")
        || matches!(claimed, "application/pdf" | "application/zip")
}

/// Text formats have no magic bytes, so the extension is trusted for them only.
fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "txt" | "log" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "json" => Some("application/json"),
        "md" => Some("text/markdown"),
        _ => None,
    }
}

fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Lowercased extension including the dot, used when naming stored objects.
pub fn dotted_extension(filename: &str) -> String {
    extension(filename)
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Sanitize filename for safe storage
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    if sanitized.chars().count() > 255 {
        return sanitized.chars().take(255).collect();
    }

    sanitized.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{UPLOAD_ALLOWED_TYPES, UPLOAD_MAX_BYTES};

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const PDF: &[u8] = b"%PDF-1.5\n%\xE2\xE3\xCF\xD3\n";

    fn allowed() -> Vec<String> {
        UPLOAD_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_accepts_png() {
        let ok = screen_upload("photo.png", PNG, Some("image/png"), UPLOAD_MAX_BYTES, &allowed()).unwrap();
        assert_eq!(ok.content_type, "image/png");
        assert_eq!(ok.filename, "photo.png");
    }

    #[test]
    fn test_accepts_pdf_despite_wrong_claim() {
        let ok = screen_upload("form.pdf", PDF, Some("image/png"), UPLOAD_MAX_BYTES, &allowed()).unwrap();
        assert_eq!(ok.content_type, "application/pdf");
    }

    #[test]
    fn test_accepts_plain_text_by_extension() {
        let ok = screen_upload("notes.txt", b"hello", None, UPLOAD_MAX_BYTES, &allowed()).unwrap();
        assert_eq!(ok.content_type, "text/plain");
    }

    #[test]
    fn test_rejects_oversized() {
        let data = vec![0u8; 11];
        let err = screen_upload("a.txt", &data, None, 10, &allowed()).unwrap_err();
        assert_eq!(err, UploadRejection::TooLarge { limit: 10 });
    }

    #[test]
    fn test_size_boundary_is_inclusive() {
        let data = vec![b'a'; 10];
        assert!(screen_upload("a.txt", &data, None, 10, &allowed()).is_ok());
    }

    #[test]
    fn test_rejects_blocked_extension() {
        let err = screen_upload("setup.EXE", b"hello", None, UPLOAD_MAX_BYTES, &allowed()).unwrap_err();
        assert_eq!(err, UploadRejection::BlockedExtension("exe".to_string()));
    }

    #[test]
    fn test_rejects_executable_magic() {
        let elf = [0x7F, 0x45, 0x4C, 0x46, 0x02, 0x01];
        let err = screen_upload("photo.jpg", &elf, Some("image/jpeg"), UPLOAD_MAX_BYTES, &allowed()).unwrap_err();
        assert!(matches!(err, UploadRejection::Executable(_)));
    }

    #[test]
    fn test_rejects_type_outside_allow_list() {
        let err = screen_upload("data.csv", b"a,b\n1,2", None, UPLOAD_MAX_BYTES, &allowed()).unwrap_err();
        assert_eq!(err, UploadRejection::DisallowedType("text/csv".to_string()));
    }

    #[test]
    fn test_garbage_claiming_image_is_downgraded_and_rejected() {
        let err = screen_upload("fake.jpg", b"not really", Some("image/jpeg"), UPLOAD_MAX_BYTES, &allowed())
            .unwrap_err();
        assert_eq!(
            err,
            UploadRejection::DisallowedType("application/octet-stream".to_string())
        );
    }

    #[test]
    fn test_sanitize_removes_path_and_dangerous_chars() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\temp\\a?b.txt"), "a_b.txt");
        assert_eq!(sanitize_filename("   "), "unnamed_file");
    }

    #[test]
    fn test_dotted_extension() {
        assert_eq!(dotted_extension("Photo.JPG"), ".jpg");
        assert_eq!(dotted_extension("README"), "");
        assert_eq!(dotted_extension("trailing."), "");
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            UploadRejection::TooLarge { limit: 5 }.message(),
            "File exceeds maximum size of 5 bytes"
        );
        assert!(UploadRejection::DisallowedType("text/csv".into())
            .message()
            .contains("text/csv"));
    }
}
