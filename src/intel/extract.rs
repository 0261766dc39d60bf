//! Structural parsing of the landing page and bundle text
//!
//! Everything here is pure text processing over artifacts that are
//! adversarial by nature: minified, renamed per release, with no stable
//! anchors beyond the patterns matched below.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

/// Script-tag marker delimiting the base64 server-config blob
pub const APP_CONFIG_MARKER: &str = r#"<script id="appServerConfig" type="text/plain">"#;

/// Path substring identifying the main web-player bundle among all script
/// links on the landing page
pub const MAIN_BUNDLE_MARKER: &str = "web-player/web-player";

static SCRIPT_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<script\s+[^>]*src=["']([^"']+\.js)["'][^>]*></script>"#)
        .expect("script src pattern is valid")
});

static MAPPING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\d+:"[^"]+"(?:,\d+:"[^"]+")*\}"#).expect("mapping pattern is valid")
});

static PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\d+):"([^"]+)""#).expect("pair pattern is valid"));

/// Extract every `<script src=...>` URL from the landing page HTML
pub fn extract_script_links(html: &str) -> Vec<String> {
    SCRIPT_SRC_RE
        .captures_iter(html)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Pick the main web-player bundle link, if any
pub fn find_main_bundle(links: &[String]) -> Option<&str> {
    links
        .iter()
        .map(String::as_str)
        .find(|link| link.contains(MAIN_BUNDLE_MARKER) && link.ends_with(".js"))
}

/// Extract the raw base64 server-config blob, if the page carries one
pub fn extract_config_blob(html: &str) -> Option<&str> {
    let start = html.find(APP_CONFIG_MARKER)? + APP_CONFIG_MARKER.len();
    let rest = &html[start..];
    let end = rest.find("</script>")?;
    Some(rest[..end].trim())
}

/// Locate the chunk hash and name tables inside the main bundle text
///
/// The bundler emits several integer-keyed object literals; the 4th and
/// 5th in source order are the hash-by-id and name-by-id tables. That
/// ordinal position is the only anchor the bundle offers, so it is
/// preserved verbatim. Returns `(hash_by_id, name_by_id)`.
///
/// # Errors
///
/// [`Error::BundleFormatChanged`] when fewer than 5 literals match; the
/// bundle layout has changed and the extraction must not silently degrade.
pub fn extract_mappings(js: &str) -> Result<(BTreeMap<u32, String>, BTreeMap<u32, String>)> {
    let literals: Vec<&str> = MAPPING_RE.find_iter(js).map(|m| m.as_str()).collect();

    if literals.len() < 5 {
        return Err(Error::bundle_format(format!(
            "expected at least 5 mapping literals in the bundle, found {}",
            literals.len()
        )));
    }

    Ok((parse_literal(literals[3]), parse_literal(literals[4])))
}

/// Parse one `{<int>:"<string>",...}` literal into an integer-keyed map
fn parse_literal(literal: &str) -> BTreeMap<u32, String> {
    PAIR_RE
        .captures_iter(literal)
        .filter_map(|cap| {
            let id = cap[1].parse::<u32>().ok()?;
            Some((id, cap[2].to_string()))
        })
        .collect()
}

/// Combine the two id tables into chunk file names `{name}.{hash}.js`
///
/// An id present in only one table has no combinable counterpart and is
/// dropped; that is never an error for the extraction as a whole.
pub fn combine_chunks(
    names: &BTreeMap<u32, String>,
    hashes: &BTreeMap<u32, String>,
) -> Vec<String> {
    names
        .iter()
        .filter_map(|(id, name)| {
            hashes
                .get(id)
                .map(|hash| format!("{}.{}.js", name, hash))
        })
        .collect()
}

/// Scan concatenated bundle text for a persisted-operation triple
/// `"<name>","<kind>","<hash>"` and return the hash token
pub fn find_operation_hash(text: &str, name: &str, kind: &str) -> Option<String> {
    let needle = format!("\"{}\",\"{}\",\"", name, kind);
    let start = text.find(&needle)? + needle.len();
    let rest = &text[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_HASH: &str = "26ff3e2dbfbeef4ba4ac79a63bdb336ec952734d1be4a8e42f708117ccc2937f";

    #[test]
    fn test_extract_script_links() {
        let html = r#"
            <html><head>
            <script defer="defer" src="https://cdn.example.com/vendor.1234.js"></script>
            <script src="https://cdn.example.com/web-player/web-player.abcd.js"></script>
            <link rel="stylesheet" href="style.css">
            </head></html>
        "#;

        let links = extract_script_links(html);
        assert_eq!(links.len(), 2);
        assert!(links[0].ends_with("vendor.1234.js"));
    }

    #[test]
    fn test_find_main_bundle_selects_only_matching_link() {
        let links = vec![
            "https://cdn.example.com/vendor.1234.js".to_string(),
            "https://cdn.example.com/web-player/web-player.abcd.js".to_string(),
        ];
        assert_eq!(
            find_main_bundle(&links),
            Some("https://cdn.example.com/web-player/web-player.abcd.js")
        );

        let no_match = vec!["https://cdn.example.com/vendor.1234.js".to_string()];
        assert_eq!(find_main_bundle(&no_match), None);
    }

    #[test]
    fn test_extract_config_blob() {
        let html = format!(
            "<body>{}aGVsbG8=</script><script src=\"x.js\"></script></body>",
            APP_CONFIG_MARKER
        );
        assert_eq!(extract_config_blob(&html), Some("aGVsbG8="));
        assert_eq!(extract_config_blob("<body>plain page</body>"), None);
    }

    #[test]
    fn test_extract_mappings_uses_fourth_and_fifth_literals() {
        let js = concat!(
            r#"var a={0:"pad0"};var b={1:"pad1"};var c={2:"pad2"};"#,
            r#"var h={0:"h0",1:"h1"};var n={0:"a",1:"b"};"#
        );

        let (hashes, names) = extract_mappings(js).unwrap();
        assert_eq!(hashes.get(&0).unwrap(), "h0");
        assert_eq!(hashes.get(&1).unwrap(), "h1");
        assert_eq!(names.get(&0).unwrap(), "a");
        assert_eq!(names.get(&1).unwrap(), "b");
    }

    #[test]
    fn test_too_few_literals_is_fatal() {
        let js = r#"var a={0:"only"};var b={1:"four"};var c={2:"of"};var d={3:"them"};"#;
        let err = extract_mappings(js).unwrap_err();
        assert!(matches!(err, Error::BundleFormatChanged(_)));
    }

    #[test]
    fn test_combine_chunks_drops_one_sided_ids() {
        let names: BTreeMap<u32, String> = [(0, "a".to_string()), (1, "b".to_string()), (7, "orphan".to_string())]
            .into_iter()
            .collect();
        let hashes: BTreeMap<u32, String> = [(0, "h0".to_string()), (1, "h1".to_string()), (9, "h9".to_string())]
            .into_iter()
            .collect();

        assert_eq!(combine_chunks(&names, &hashes), vec!["a.h0.js", "b.h1.js"]);
    }

    #[test]
    fn test_find_operation_hash() {
        let buffer = format!(r#"noise "fooOperation","query","{}" more noise"#, SAMPLE_HASH);
        assert_eq!(
            find_operation_hash(&buffer, "fooOperation", "query").unwrap(),
            SAMPLE_HASH
        );
        assert_eq!(find_operation_hash(&buffer, "fooOperation", "mutation"), None);
        assert_eq!(find_operation_hash(&buffer, "barOperation", "query"), None);
    }
}
