//! Utterance clean-up applied before sentiment classification.
//!
//! Social-media noise (links, `@mentions`, `#` markers) carries no tone and
//! confuses the Twitter-trained classifier, so it is stripped first.

use regex::Regex;
use std::sync::LazyLock;

/// Anything starting with `http`, `https` or `www` up to the next whitespace.
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+|https\S+").expect("valid regex"));

/// `@mention` tokens and bare `#` characters.
static MENTION_OR_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+|#").expect("valid regex"));

/// Strip URLs, `@mentions` and `#` markers, then trim surrounding whitespace.
///
/// Hashtag text is kept (`#great` becomes `great`). Interior whitespace left
/// behind by a removal is not collapsed, so
/// `"check out http://example.com #great @bob"` becomes `"check out  great"`.
///
/// Removal repeats until nothing more matches, which makes the function
/// idempotent even when a removal splices a new marker together
/// (`"ht#tp://x"` → `"http://x"` → `""`).
pub fn normalize(text: &str) -> String {
    let mut current = strip_markers(text);
    loop {
        let next = strip_markers(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_owned()
}

fn strip_markers(text: &str) -> String {
    let without_urls = URL_PATTERN.replace_all(text, "");
    MENTION_OR_HASH.replace_all(&without_urls, "").into_owned()
}
