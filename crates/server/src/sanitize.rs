//! HTML sanitization for user-supplied free text. Names lose all markup;
//! descriptions keep basic formatting. File content is never sanitized,
//! it is code.

use ammonia::Builder;

/// Strip every HTML tag, keeping the inner text.
pub fn strip_html(input: &str) -> String {
    Builder::empty().clean(input).to_string()
}

/// Allow a small set of formatting tags and nothing else.
pub fn clean_description(input: &str) -> String {
    Builder::empty()
        .add_tags(["b", "i", "em", "strong", "p", "br"])
        .clean(input)
        .to_string()
}
