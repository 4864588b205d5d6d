//! Directive mini-language read from markup attributes.
//!
//! The attribute directive is a comma-separated pair list:
//!
//! ```text
//! pairList := pair (',' pair)*
//! pair     := attrName ':' key
//! ```
//!
//! Whitespace around tokens is insignificant and a pair splits on its first
//! colon. Parsing never fails: malformed pairs are dropped and counted.

/// One `attrName:key` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding<'a> {
    pub attribute: &'a str,
    pub key: &'a str,
}

/// Valid pairs of an attribute directive, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDirective<'a> {
    pub bindings: Vec<AttributeBinding<'a>>,
    /// Non-empty tokens that were not valid pairs.
    pub malformed: usize,
}

/// What a single element's directive asks the engine to translate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveBinding<'a> {
    Text(&'a str),
    Attributes(AttributeDirective<'a>),
}

/// Parses the text directive.
///
/// The value is the key verbatim; an empty value binds nothing.
#[must_use]
pub fn parse_text_directive(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[must_use]
pub fn parse_attribute_directive(source: &str) -> AttributeDirective<'_> {
    let mut directive = AttributeDirective::default();

    for token in source.split(',').map(str::trim).filter(|token| !token.is_empty()) {
        match parse_pair(token) {
            Some(binding) => directive.bindings.push(binding),
            None => {
                tracing::trace!(token, "Skipping malformed attribute directive pair");
                directive.malformed += 1;
            }
        }
    }

    directive
}

/// Splits one trimmed token on its first colon.
///
/// `None` when the key is empty or the attribute name is not settable.
fn parse_pair(token: &str) -> Option<AttributeBinding<'_>> {
    let (attribute, key) = token.split_once(':')?;
    let attribute = attribute.trim();
    let key = key.trim();

    if key.is_empty() || !is_valid_attribute_name(attribute) {
        return None;
    }

    Some(AttributeBinding { attribute, key })
}

/// Names a document would refuse to set: empty, whitespace, quotes, `>`, `/`, `=`
/// or control characters.
pub(crate) fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '/' | '=')
        })
}
