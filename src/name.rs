//! Object name classification and encoding.
//!
//! Names stored by the application come in two shapes:
//! - `image/<32 word chars>[/suffix | .ext]` lives on Thumbor
//! - anything else lives on the local filesystem
//!
//! Older records carry a leading `/` (`/image/<key>/...`). Both forms classify
//! the same way; outbound requests always use the canonical `/`-prefixed form
//! and freshly saved names are handed back without it.

use std::borrow::Cow;
use std::sync::LazyLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

static THUMBOR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/?image/(?P<key>\w{32})(?:[/.].*)?$").expect("Thumbor name pattern is valid")
});

/// Characters left untouched in a `Slug` header: unreserved plus the RFC 3986
/// reserved set.
const SLUG: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

/// A name that matched the Thumbor pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteName<'a> {
    name: &'a str,
    key: &'a str,
}

impl<'a> RemoteName<'a> {
    /// The name exactly as it was classified.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The 32-character Thumbor key.
    pub fn key(&self) -> &'a str {
        self.key
    }
}

/// Which backend owns a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Remote(RemoteName<'a>),
    Local,
}

/// Classify a name. Pure: no I/O, same answer for the same input.
pub fn classify(name: &str) -> Route<'_> {
    match THUMBOR_NAME.captures(name).and_then(|c| c.name("key")) {
        Some(key) => Route::Remote(RemoteName {
            name,
            key: key.as_str(),
        }),
        None => Route::Local,
    }
}

pub fn is_remote(name: &str) -> bool {
    matches!(classify(name), Route::Remote(_))
}

/// Absolute-path form used to address a name on the read-write host.
pub fn canonicalize(name: &str) -> Cow<'_, str> {
    if name.starts_with('/') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("/{name}"))
    }
}

/// Form persisted by the caller after a save.
pub fn strip_leading_separator(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// Percent-encode a name's UTF-8 bytes for the `Slug` header.
pub fn encode_slug(name: &str) -> String {
    utf8_percent_encode(name, SLUG).to_string()
}

/// Decode a percent-encoded `Location` header value.
pub fn decode_location(location: &str) -> String {
    percent_decode_str(location).decode_utf8_lossy().into_owned()
}
