//! MIME type helpers used to gate the resize step.

/// True when the MIME type starts with `image`. Case-sensitive, no trimming.
pub fn is_image(mime_type: &str) -> bool {
    mime_type.starts_with("image")
}

/// Loose syntactic check for `type/subtype[; params]`.
pub fn is_valid(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    let Some((top, sub)) = essence.split_once('/') else {
        return false;
    };
    let token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    token(top) && token(sub)
}

/// Best-effort sniffing for files handed in without a declared type.
pub fn detect(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        [0x25, 0x50, 0x44, 0x46, ..] => "application/pdf",
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, ..] => "video/mp4",
        _ => {
            tracing::debug!(
                "Unrecognized file signature (first 4 bytes: {:02X?}), falling back to application/octet-stream",
                &bytes[..bytes.len().min(4)]
            );
            "application/octet-stream"
        }
    }
}
