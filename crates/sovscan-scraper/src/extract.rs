//! Plain-text extraction from raw page markup.

use regex::{Captures, Regex};

/// Reduce HTML to readable text.
///
/// Drops comments and `script`/`style`/`noscript` elements with their
/// content, replaces remaining tags with spaces, decodes common character
/// references, and collapses all whitespace runs to single spaces.
#[must_use]
pub fn extract_text(html: &str) -> String {
    let comment_re = Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex");
    let script_re =
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script regex");
    let style_re = Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid style regex");
    let noscript_re =
        Regex::new(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>").expect("valid noscript regex");
    let tag_re = Regex::new(r"(?s)<[^>]*>").expect("valid tag regex");

    let text = comment_re.replace_all(html, " ");
    let text = script_re.replace_all(&text, " ");
    let text = style_re.replace_all(&text, " ");
    let text = noscript_re.replace_all(&text, " ");
    let text = tag_re.replace_all(&text, " ");
    let text = decode_entities(&text);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    let numeric_re = Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));")
        .expect("valid numeric entity regex");

    let decoded = numeric_re.replace_all(text, |caps: &Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map_or_else(|| " ".to_string(), |c| c.to_string())
    });

    // `&amp;` last so "&amp;lt;" decodes to the literal "&lt;".
    decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
