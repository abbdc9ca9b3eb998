//! Shared key generation for storage backends.
//!
//! Key format: `media/{filename}` for originals, `media/sizes/{filename}`
//! for derived renditions. All backends must use this layout so that keys
//! written by one backend resolve under another.

/// Generate the storage key for an original media file.
pub fn media_key(filename: &str) -> String {
    format!("media/{}", filename)
}

/// Generate the storage key for a derived rendition file.
pub fn variant_key(filename: &str) -> String {
    format!("media/sizes/{}", filename)
}
