//! Request descriptor for a decoy-SNI fetch.

use crate::base::neterror::NetError;
use crate::http::headers::{is_valid_header, RequestHeaders};
use bytes::Bytes;
use http::Method;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What to fetch: method, target URL, headers, body and an optional
/// external cancellation token.
///
/// Only `https` URLs with a host are accepted. The port defaults to 443.
///
/// # Example
///
/// ```rust,ignore
/// use decoynet::http::RequestSpec;
///
/// let request = RequestSpec::get("https://i.pximg.net/img-original/img/1.png")?
///     .header("Referer", "https://www.pixiv.net/");
/// ```
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    url: Url,
    headers: RequestHeaders,
    body: Bytes,
    cancel: Option<CancellationToken>,
}

impl RequestSpec {
    pub fn new(method: Method, url: &str) -> Result<Self, NetError> {
        Self::from_url(method, Url::parse(url)?)
    }

    pub fn from_url(method: Method, url: Url) -> Result<Self, NetError> {
        if url.scheme() != "https" {
            return Err(NetError::DisallowedUrlScheme);
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(NetError::InvalidUrl);
        }
        Ok(Self {
            method,
            url,
            headers: RequestHeaders::new(),
            body: Bytes::new(),
            cancel: None,
        })
    }

    pub fn get(url: &str) -> Result<Self, NetError> {
        Self::new(Method::GET, url)
    }

    pub fn post(url: &str) -> Result<Self, NetError> {
        Self::new(Method::POST, url)
    }

    /// Adds a header. Names that are not HTTP tokens and values containing
    /// line breaks are dropped with a warning; see [`RequestSpec::try_header`]
    /// to reject them instead.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if self.insert_header(name.clone(), value.into()).is_err() {
            tracing::warn!(header = %name, "dropping invalid request header");
        }
        self
    }

    /// Adds a header, failing with [`NetError::InvalidHeader`] if it could
    /// not be written on the wire as given.
    pub fn try_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, NetError> {
        self.insert_header(name.into(), value.into())?;
        Ok(self)
    }

    fn insert_header(&mut self, name: String, value: String) -> Result<(), NetError> {
        if !is_valid_header(&name, &value) {
            return Err(NetError::InvalidHeader);
        }
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |req, (k, v)| req.header(k, v))
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Ties the fetch to `token`; cancelling it aborts every attempt.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The true host, sent in `Host` and used for resolution.
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(443)
    }

    /// Path plus query, as it goes on the request line.
    pub fn path(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }

    pub fn header_list(&self) -> &RequestHeaders {
        &self.headers
    }

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_decomposition() {
        let req = RequestSpec::get("https://i.pximg.net/img-original/1.png?size=large").unwrap();
        assert_eq!(req.hostname(), "i.pximg.net");
        assert_eq!(req.port(), 443);
        assert_eq!(req.path(), "/img-original/1.png?size=large");
    }

    #[test]
    fn test_default_path_and_explicit_port() {
        let req = RequestSpec::get("https://example.com:8443").unwrap();
        assert_eq!(req.path(), "/");
        assert_eq!(req.port(), 8443);
    }

    #[test]
    fn test_scheme_restricted_to_https() {
        assert!(matches!(
            RequestSpec::get("http://example.com/"),
            Err(NetError::DisallowedUrlScheme)
        ));
        assert!(matches!(
            RequestSpec::get("::not a url::"),
            Err(NetError::InvalidUrl)
        ));
    }

    #[test]
    fn test_invalid_headers_dropped() {
        let req = RequestSpec::get("https://example.com/")
            .unwrap()
            .header("X-Test", "1")
            .header("Bad Name", "x")
            .header("X-Evil", "a\r\nHost: other");
        assert_eq!(req.header_list().len(), 1);
        assert_eq!(req.header_list().get("x-test"), Some("1"));
    }

    #[test]
    fn test_try_header_rejects_invalid() {
        let req = RequestSpec::get("https://example.com/")
            .unwrap()
            .try_header("Referer", "https://www.pixiv.net/")
            .unwrap();
        assert_eq!(req.header_list().get("referer"), Some("https://www.pixiv.net/"));

        let err = req
            .clone()
            .try_header("X-Evil", "a\r\nHost: other")
            .unwrap_err();
        assert!(matches!(err, NetError::InvalidHeader));
        assert!(matches!(
            req.try_header("Bad Name", "x"),
            Err(NetError::InvalidHeader)
        ));
    }

    #[test]
    fn test_body_and_cancel() {
        let token = CancellationToken::new();
        let req = RequestSpec::post("https://example.com/upload")
            .unwrap()
            .body("payload")
            .cancel_token(token.clone());
        assert_eq!(*req.method(), Method::POST);
        assert_eq!(req.body_bytes().as_ref(), b"payload");
        token.cancel();
        assert!(req.cancellation().unwrap().is_cancelled());
    }
}
