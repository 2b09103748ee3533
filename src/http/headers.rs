//! Request header list with preserved order and casing.

/// Headers the engine always writes itself, after everything else.
pub const FORCED_HEADERS: [&str; 4] = ["Host", "Connection", "Accept-Encoding", "Content-Length"];

/// Ordered `(name, value)` pairs.
///
/// Names compare case-insensitively but keep the casing they were inserted
/// with; re-inserting an existing name updates the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    headers: Vec<(String, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Insert header with preserved casing.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if let Some((_, v)) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            *v = value;
        } else {
            self.headers.push((name, value));
        }
    }

    /// Get header value (case-insensitive lookup).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self
            .headers
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(pos).1)
    }

    /// Headers with names in dash-separated title case.
    ///
    /// Only the first character of each segment is uppercased, the rest is
    /// left as supplied: `x-test` becomes `X-Test`, `x-MyApp` becomes `X-MyApp`.
    pub fn as_title_case(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.headers
            .iter()
            .map(|(n, v)| (title_case(n), v.as_str()))
    }

    /// Get all headers as-is with original casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

pub fn title_case(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

pub fn is_forced(name: &str) -> bool {
    FORCED_HEADERS.iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// Rejects names that are not HTTP tokens and values carrying line breaks,
/// either of which would let a header smuggle extra lines onto the wire.
pub fn is_valid_header(name: &str, value: &str) -> bool {
    http::header::HeaderName::from_bytes(name.as_bytes()).is_ok()
        && !value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0)
}
