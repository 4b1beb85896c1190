// src/fingerprint.rs
//! Content identity. The fingerprint is the key of every dedup layer, so it
//! must be stable across retries, feeds, and process restarts.

use sha2::{Digest, Sha256};

/// Fixed-width identity token for a normalized item: SHA-256 of the
/// normalized URL, or of `title|body` when the URL is empty.
pub fn fingerprint(url: &str, title: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    if !url.is_empty() {
        hasher.update(url.as_bytes());
    } else {
        hasher.update(title.as_bytes());
        hasher.update(b"|");
        hasher.update(body.as_bytes());
    }
    to_hex(&hasher.finalize())
}

fn to_hex(digest: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_dominates_title_and_body() {
        let a = fingerprint("https://example.com/p", "title one", "body one");
        let b = fingerprint("https://example.com/p", "title two", "body two");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_url_falls_back_to_title_and_body() {
        let a = fingerprint("", "t", "b");
        assert_eq!(a, fingerprint("", "t", "b"));
        assert_ne!(a, fingerprint("", "t2", "b"));
        assert_ne!(a, fingerprint("", "t", "b2"));
    }

    #[test]
    fn separator_keeps_fields_apart() {
        assert_ne!(fingerprint("", "ab", "c"), fingerprint("", "a", "bc"));
    }

    #[test]
    fn fixed_width_lowercase_hex() {
        let f = fingerprint("https://example.com", "", "");
        assert_eq!(f.len(), 64);
        assert!(f.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
