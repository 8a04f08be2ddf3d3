//! Pinterest image key to CDN URL conversion.

/// Converts a pinterest hex key into a 400px image URL.
///
/// The first six characters of the key become three two-character path
/// segments, and the full key is the file name:
///
/// ```
/// use affinity::image_url::key_to_url;
///
/// assert_eq!(
///     key_to_url("abcdef1234"),
///     "http://i.pinimg.com/400x/ab/cd/ef/abcdef1234.jpg"
/// );
/// ```
///
/// No validation is performed. Keys shorter than six characters produce
/// short or empty segments (`"ab"` gives `.../400x/ab///ab.jpg`) and the
/// function never panics, including on multi-byte input.
#[must_use]
pub fn key_to_url(key: &str) -> String {
    format!(
        "http://i.pinimg.com/400x/{}/{}/{}/{}.jpg",
        segment(key, 0),
        segment(key, 2),
        segment(key, 4),
        key
    )
}

/// Characters `start..start + 2` of `key`, clamped to its length.
///
/// Works on chars rather than bytes so a slice never splits a code point.
fn segment(key: &str, start: usize) -> &str {
    let mut offsets = key
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(key.len()));
    let begin = offsets.nth(start).unwrap_or(key.len());
    let end = offsets.nth(1).unwrap_or(key.len());
    &key[begin..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_key() {
        assert_eq!(
            key_to_url("abcdef1234"),
            "http://i.pinimg.com/400x/ab/cd/ef/abcdef1234.jpg"
        );
    }

    #[test]
    fn test_exactly_six_chars() {
        assert_eq!(
            key_to_url("0a1b2c"),
            "http://i.pinimg.com/400x/0a/1b/2c/0a1b2c.jpg"
        );
    }

    #[test]
    fn test_short_key_keeps_empty_segments() {
        assert_eq!(key_to_url("ab"), "http://i.pinimg.com/400x/ab///ab.jpg");
        assert_eq!(key_to_url("abc"), "http://i.pinimg.com/400x/ab/c//abc.jpg");
        assert_eq!(key_to_url("abcde"), "http://i.pinimg.com/400x/ab/cd/e/abcde.jpg");
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(key_to_url(""), "http://i.pinimg.com/400x////.jpg");
    }

    #[test]
    fn test_multibyte_key_does_not_panic() {
        assert_eq!(
            key_to_url("ééééééé"),
            "http://i.pinimg.com/400x/éé/éé/éé/ééééééé.jpg"
        );
    }

    #[test]
    fn test_realistic_hash() {
        let key = "d41d8cd98f00b204e9800998ecf8427e";
        let url = key_to_url(key);
        assert_eq!(url, format!("http://i.pinimg.com/400x/d4/1d/8c/{key}.jpg"));
    }
}
