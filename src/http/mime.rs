//! MIME type module
//!
//! Content types the API emits, and image type detection for uploads that
//! arrive without a part `Content-Type`.

use std::path::Path;

/// Content type of every JSON response.
pub const JSON: &str = "application/json; charset=utf-8";

/// Stored for uploads whose type cannot be determined.
pub const DEFAULT_IMAGE: &str = "image/jpeg";

/// Guess an image content type from the uploaded file name.
///
/// # Examples
/// ```ignore
/// assert_eq!(guess_image_type("pho.PNG"), Some("image/png"));
/// assert_eq!(guess_image_type("menu.pdf"), None);
/// ```
pub fn guess_image_type(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)?;

    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" | "jfif" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "avif" => Some("image/avif"),
        "bmp" => Some("image/bmp"),
        "ico" => Some("image/x-icon"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_image_types() {
        assert_eq!(guess_image_type("dish.png"), Some("image/png"));
        assert_eq!(guess_image_type("dish.JPG"), Some("image/jpeg"));
        assert_eq!(guess_image_type("photos/banh-mi.webp"), Some("image/webp"));
        assert_eq!(guess_image_type("logo.svg"), Some("image/svg+xml"));
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(guess_image_type("notes.txt"), None);
        assert_eq!(guess_image_type("image"), None);
        assert_eq!(guess_image_type(""), None);
    }
}
