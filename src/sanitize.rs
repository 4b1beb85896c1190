// src/sanitize.rs
//! Feed-item normalization. Pure functions, no errors: malformed input
//! degrades to best-effort empty strings rather than failing the pipeline.

use once_cell::sync::OnceCell;

use crate::types::{NormalizedItem, RawItem};

/// Hard cap on normalized body length, in characters.
pub const MAX_BODY_CHARS: usize = 5000;

/// Normalize free text: decode HTML entities, strip tags, collapse whitespace
/// runs to single spaces, trim, cap at [`MAX_BODY_CHARS`].
///
/// Entities are decoded before tags are stripped; after one pass the output
/// contains no decodable entities and no complete tags, so a second pass
/// returns it unchanged.
pub fn clean_text(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    // 1) HTML entity decode (covers &nbsp; &amp; &lt; &gt; &quot; and friends)
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace (includes the U+00A0 produced by &nbsp;)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 4) Length cap: hard cut, no word-boundary handling
    if out.chars().count() > MAX_BODY_CHARS {
        out = out.chars().take(MAX_BODY_CHARS).collect();
    }

    out
}

/// Drop the query string and fragment, keep scheme/host/path. Anything that
/// does not parse as a URL passes through untouched.
pub fn normalize_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut u) => {
            u.set_query(None);
            u.set_fragment(None);
            u.to_string()
        }
        Err(_) => raw.to_string(),
    }
}

/// Normalize one raw feed entry. If the cleaned body comes out empty, the
/// cleaned description stands in for it.
pub fn sanitize(raw: &RawItem) -> NormalizedItem {
    let description = clean_text(&raw.description);
    let body = match raw.body.as_deref().map(clean_text) {
        Some(b) if !b.is_empty() => b,
        _ => description,
    };

    NormalizedItem {
        title: raw.title.trim().to_string(),
        body,
        url: normalize_url(&raw.link),
        author: raw.author.trim().to_string(),
        published_at: raw.published_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_ok() {
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn strips_html_and_unescapes() {
        let s = "<p>Ben &amp; Jerry&nbsp;say <b>&quot;hi&quot;</b></p>";
        assert_eq!(clean_text(s), r#"Ben & Jerry say "hi""#);
    }

    #[test]
    fn folds_whitespace_and_nbsp() {
        let s = "A\u{00A0}\n\tB   C";
        assert_eq!(clean_text(s), "A B C");
    }

    #[test]
    fn length_cap_is_exact() {
        let s = "x".repeat(6000);
        assert_eq!(clean_text(&s).chars().count(), MAX_BODY_CHARS);
    }

    #[test]
    fn clean_text_is_idempotent() {
        let inputs = [
            "<div>Breaking: &lt;tag&gt; prices &amp; rates   move</div>",
            "  plain   text with\nnewlines  ",
            "<a href=\"x\">link</a>&nbsp;&nbsp;tail",
        ];
        for s in inputs {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn url_loses_query_and_fragment() {
        assert_eq!(
            normalize_url("https://example.com/a/b?utm_source=x&ref=y#frag"),
            "https://example.com/a/b"
        );
    }

    #[test]
    fn unparseable_url_passes_through() {
        assert_eq!(normalize_url("not a url"), "not a url");
    }

    #[test]
    fn description_stands_in_for_empty_body() {
        let raw = RawItem {
            title: " Title ".into(),
            description: "<p>desc</p>".into(),
            link: "https://example.com/x?q=1".into(),
            body: Some("<br/>".into()),
            ..Default::default()
        };
        let n = sanitize(&raw);
        assert_eq!(n.title, "Title");
        assert_eq!(n.body, "desc");
        assert_eq!(n.url, "https://example.com/x");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let raw = RawItem {
            title: "  T  ".into(),
            description: "d &amp; e".into(),
            link: "https://example.com/p?x=1#f".into(),
            author: " a ".into(),
            body: Some("<b>B</b>   C".into()),
            ..Default::default()
        };
        let once = sanitize(&raw);
        let again = sanitize(&RawItem {
            title: once.title.clone(),
            description: once.body.clone(),
            link: once.url.clone(),
            author: once.author.clone(),
            published_at: once.published_at,
            body: Some(once.body.clone()),
        });
        assert_eq!(again, once);
    }
}
