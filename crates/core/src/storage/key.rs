//! Object keys for produced media.

use std::fmt;

use crate::extraction::ExtractedMedia;

/// Address of one stored object within the bucket.
///
/// Derived from the provider-assigned media id and the produced extension,
/// e.g. `abc123.mp3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Key for a produced media file: `{id}.{ext}`.
    #[must_use]
    pub fn for_media(media: &ExtractedMedia) -> Self {
        let name = if media.extension.is_empty() {
            media.id.clone()
        } else {
            format!("{}.{}", media.id, media.extension)
        };
        Self(sanitize_key(&name))
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sanitize a name for use as a storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_from_id_and_extension() {
        let media = ExtractedMedia::new("abc123", "/tmp/ws/abc123.mp3");
        assert_eq!(ObjectKey::for_media(&media).as_str(), "abc123.mp3");
    }

    #[test]
    fn test_key_uses_produced_extension() {
        let media = ExtractedMedia::new("abc123", "/tmp/ws/abc123.opus");
        assert_eq!(ObjectKey::for_media(&media).to_string(), "abc123.opus");
    }

    #[test]
    fn test_key_without_extension() {
        let media = ExtractedMedia::new("abc123", "/tmp/ws/abc123");
        assert_eq!(ObjectKey::for_media(&media).as_str(), "abc123");
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("dQw4w9WgXcQ.mp3"), "dQw4w9WgXcQ.mp3");
        assert_eq!(sanitize_key("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_key("a b?.mp3"), "a_b_.mp3");
    }

    proptest! {
        #[test]
        fn prop_key_only_contains_safe_chars(id in ".*", ext in "[a-z0-9]{1,4}") {
            let media = ExtractedMedia::new(id, format!("/tmp/ws/x.{ext}"));
            let key = ObjectKey::for_media(&media);

            for c in key.as_str().chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in key: {}", c);
            }
            let expected_suffix = format!(".{ext}");
            prop_assert!(key.as_str().ends_with(&expected_suffix));
        }

        #[test]
        fn prop_distinct_safe_ids_give_distinct_keys(
            a in "[a-zA-Z0-9_-]{1,16}",
            b in "[a-zA-Z0-9_-]{1,16}",
        ) {
            prop_assume!(a != b);
            let ka = ObjectKey::for_media(&ExtractedMedia::new(a.clone(), format!("/w/{a}.mp3")));
            let kb = ObjectKey::for_media(&ExtractedMedia::new(b.clone(), format!("/w/{b}.mp3")));
            prop_assert_ne!(ka, kb);
        }
    }
}
