//! Request identity keys.

use sha2::{Digest, Sha256};

use crate::http::Method;

/// Compute the identity key of a request: method plus URL, fragment removed.
///
/// Headers never participate, so requests that differ only in headers share
/// an entry.
pub fn request_key(method: &Method, url: &url::Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> url::Url {
        url::Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let a = request_key(&Method::GET, &url("https://tv.local/app.js"));
        let b = request_key(&Method::GET, &url("https://tv.local/app.js"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_different_method() {
        let get = request_key(&Method::GET, &url("https://tv.local/api"));
        let head = request_key(&Method::HEAD, &url("https://tv.local/api"));
        assert_ne!(get, head);
    }

    #[test]
    fn test_key_ignores_fragment_but_not_query() {
        let plain = request_key(&Method::GET, &url("https://tv.local/index.html"));
        let fragment = request_key(&Method::GET, &url("https://tv.local/index.html#player"));
        let query = request_key(&Method::GET, &url("https://tv.local/index.html?x=1"));
        assert_eq!(plain, fragment);
        assert_ne!(plain, query);
    }

    #[test]
    fn test_key_format() {
        let key = request_key(&Method::GET, &url("https://tv.local/"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
