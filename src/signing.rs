//! Thumbor URL signing.
//!
//! A signed path is `/<signature>/<key>` where the signature is the URL-safe
//! base64 of HMAC-SHA1(security_key, key). Thumbor verifies it on its side, so
//! generated URLs never need a round-trip.

use base64::Engine;
use regex::Regex;
use ring::hmac;

pub struct UrlSigner {
    server: String,
    key: hmac::Key,
    public_url_pattern: Regex,
}

impl UrlSigner {
    pub fn new(server: &str, security_key: &str) -> Self {
        let server = server.trim_end_matches('/').to_string();
        let public_url_pattern = Regex::new(&format!(
            r"^{}/[\w\-=]{{28}}/(?P<key>\w{{32}})(?P<extra>.*)$",
            regex::escape(&server)
        ))
        .expect("escaped server yields a valid pattern");
        Self {
            server,
            key: hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, security_key.as_bytes()),
            public_url_pattern,
        }
    }

    /// The public read-only host.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Signed path for an image key, deterministic for a given secret.
    pub fn sign(&self, image_key: &str) -> String {
        let tag = hmac::sign(&self.key, image_key.as_bytes());
        let signature = base64::engine::general_purpose::URL_SAFE.encode(tag.as_ref());
        format!("/{signature}/{image_key}")
    }

    pub fn public_url(&self, image_key: &str) -> String {
        format!("{}{}", self.server, self.sign(image_key))
    }

    /// Split a public URL produced by this signer's host into its key and
    /// whatever trails the key. The signature itself is not checked.
    pub fn parse_public_url<'a>(&self, url: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.public_url_pattern.captures(url)?;
        let key = captures.name("key")?.as_str();
        let extra = captures.name("extra").map_or("", |m| m.as_str());
        Some((key, extra))
    }
}
