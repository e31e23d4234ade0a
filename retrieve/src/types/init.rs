use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;

use super::{AbortSignal, Payload};
use crate::Error;

/// Transport init options as supplied by the caller.
///
/// Normalized into a [`RequestInit`] by [`build_init`](crate::build_init)
/// without being modified.
#[derive(Clone, Debug, Default)]
pub struct Init {
    /// Request method, any case. Defaults to `GET`.
    pub method: Option<String>,
    pub headers: Option<HeadersInit>,
    /// Body used when the configuration carries no data.
    pub body: Option<Payload>,
    pub signal: Option<AbortSignal>,
    pub redirect: Option<RedirectMode>,
}

impl Init {
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_headers(mut self, headers: impl Into<HeadersInit>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    /// Appends a header, keeping any headers already set.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut pairs = match self.headers.take() {
            Some(headers) => headers.into_pairs(),
            None => Vec::new(),
        };
        pairs.push((name.into(), value.into()));
        self.headers = Some(HeadersInit::Pairs(pairs));
        self
    }

    pub fn with_body(mut self, body: impl Into<Payload>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_redirect(mut self, redirect: RedirectMode) -> Self {
        self.redirect = Some(redirect);
        self
    }
}

/// The accepted shapes of caller-supplied headers.
#[derive(Clone, Debug)]
pub enum HeadersInit {
    /// Ordered name/value pairs. Repeated names are joined into one value.
    Pairs(Vec<(String, String)>),
    /// Plain name to value mapping.
    Record(BTreeMap<String, String>),
    /// An existing header collection.
    Map(HeaderMap),
}

impl HeadersInit {
    /// Builds a case-insensitive header map, rejecting invalid names or values.
    ///
    /// Repeated names end up as a single header whose values are joined
    /// with `", "` in order.
    pub(crate) fn to_header_map(&self) -> Result<HeaderMap, Error> {
        match self {
            Self::Map(map) => {
                let mut joined = HeaderMap::with_capacity(map.keys_len());
                for name in map.keys() {
                    let values: Vec<_> = map.get_all(name).iter().collect();
                    let value = match values.as_slice() {
                        [value] => (*value).clone(),
                        values => {
                            let values: Vec<_> = values
                                .iter()
                                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                                .collect();
                            header_value(name.as_str(), &values.join(", "))?
                        }
                    };
                    joined.insert(name.clone(), value);
                }
                Ok(joined)
            }
            Self::Pairs(pairs) => join_pairs(pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))),
            Self::Record(record) => {
                join_pairs(record.iter().map(|(n, v)| (n.as_str(), v.as_str())))
            }
        }
    }

    fn into_pairs(self) -> Vec<(String, String)> {
        match self {
            Self::Pairs(pairs) => pairs,
            Self::Record(record) => record.into_iter().collect(),
            Self::Map(map) => map
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
        }
    }
}

fn join_pairs<'a, I>(pairs: I) -> Result<HeaderMap, Error>
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        let header = header_name(name)?;
        let value = match map.get(&header) {
            Some(existing) => {
                let existing = String::from_utf8_lossy(existing.as_bytes());
                header_value(name, &format!("{}, {}", existing, value))?
            }
            None => header_value(name, value)?,
        };
        map.insert(header, value);
    }
    Ok(map)
}

fn header_name(name: &str) -> Result<HeaderName, Error> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::Config(format!("invalid header name `{}`: {}", name, e)))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Config(format!("invalid value for header `{}`: {}", name, e)))
}

impl From<Vec<(String, String)>> for HeadersInit {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Pairs(pairs)
    }
}

impl From<Vec<(&str, &str)>> for HeadersInit {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        Self::Pairs(
            pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for HeadersInit {
    fn from(record: BTreeMap<String, String>) -> Self {
        Self::Record(record)
    }
}

impl From<HeaderMap> for HeadersInit {
    fn from(map: HeaderMap) -> Self {
        Self::Map(map)
    }
}

/// How the transport treats redirects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RedirectMode {
    #[default]
    Follow,
    /// Fail the request when a redirect is returned.
    Error,
    /// Return the redirect response itself.
    Manual,
}

/// Normalized init passed to the transport.
#[derive(Clone, Debug)]
pub struct RequestInit {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Payload>,
    pub signal: Option<AbortSignal>,
    pub redirect: RedirectMode,
}

impl Default for RequestInit {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            signal: None,
            redirect: RedirectMode::default(),
        }
    }
}
