use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;

use crate::body::{BodyType, CONTENT_TYPE_JSON};
use crate::types::{AbortSignal, Payload, RequestInit};
use crate::{Error, RetrieveConfig};

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Computes the init passed to the transport.
///
/// Works on a copy of `config.init`. When `config.data` is present its body
/// type is inferred in this order: bytes, blob, form data, JSON (JSON
/// content type, or no content type on a method other than GET/HEAD), text.
/// The content type is defaulted from the inferred type, except for form
/// data which never carries one.
pub fn build_init(config: &RetrieveConfig) -> Result<RequestInit, Error> {
    let original = &config.init;
    let method = parse_method(original.method.as_deref().unwrap_or("GET"))?;

    let mut headers = match &original.headers {
        Some(headers) => headers.to_header_map()?,
        None => HeaderMap::new(),
    };
    if !headers.contains_key(X_REQUESTED_WITH) {
        headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
    }

    let body_type = config
        .data
        .as_ref()
        .and_then(|data| infer_body_type(data, &headers, &method));
    match body_type {
        Some(BodyType::FormData) => {
            headers.remove(CONTENT_TYPE);
        }
        Some(body_type) if !headers.contains_key(CONTENT_TYPE) => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(body_type.content_type()));
        }
        _ => {}
    }

    let body = match (&config.data, body_type) {
        (Some(Payload::Json(value)), Some(BodyType::Json)) => Some(Payload::Text(to_json(value)?)),
        (Some(Payload::Text(text)), Some(BodyType::Json)) => Some(Payload::Text(to_json(text)?)),
        (Some(data), _) => Some(data.clone()),
        (None, _) => original.body.clone(),
    };

    let signal = match (&original.signal, config.timeout) {
        (Some(signal), _) => Some(signal.clone()),
        (None, Some(timeout)) if !timeout.is_zero() => Some(AbortSignal::timeout(timeout)),
        _ => None,
    };

    Ok(RequestInit {
        method,
        headers,
        body,
        signal,
        redirect: original.redirect.unwrap_or_default(),
    })
}

fn parse_method(method: &str) -> Result<Method, Error> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|e| Error::Config(format!("invalid method `{}`: {}", method, e)))
}

fn infer_body_type(data: &Payload, headers: &HeaderMap, method: &Method) -> Option<BodyType> {
    match data {
        Payload::Bytes(_) => return Some(BodyType::Bytes),
        Payload::Blob(_) => return Some(BodyType::Blob),
        Payload::Form(_) => return Some(BodyType::FormData),
        Payload::Text(_) | Payload::Json(_) => {}
    }

    let is_json = match headers.get(CONTENT_TYPE) {
        Some(content_type) => content_type
            .to_str()
            .unwrap_or_default()
            .to_ascii_lowercase()
            .starts_with(CONTENT_TYPE_JSON),
        None => method != Method::GET && method != Method::HEAD,
    };

    if is_json {
        Some(BodyType::Json)
    } else if matches!(data, Payload::Text(_)) {
        Some(BodyType::Text)
    } else {
        None
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    serde_json::to_string(value)
        .map_err(|e| Error::Config(format!("failed to serialize JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::types::{AbortController, Blob, FormData, Init};

    fn init_for(config: RetrieveConfig) -> RequestInit {
        build_init(&config).unwrap()
    }

    fn content_type(init: &RequestInit) -> Option<&str> {
        init.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    #[test]
    fn defaults_to_get_with_marker_header() {
        let init = init_for(RetrieveConfig::new("http://example.org"));
        assert_eq!(init.method, Method::GET);
        assert_eq!(init.headers.len(), 1);
        assert_eq!(init.headers["x-requested-with"], "XMLHttpRequest");
        assert!(init.body.is_none());
        assert!(init.signal.is_none());
    }

    #[test]
    fn method_is_uppercased() {
        let init = init_for(RetrieveConfig::new("http://example.org").with_method("patch"));
        assert_eq!(init.method, Method::PATCH);
    }

    #[test]
    fn marker_header_is_not_overwritten() {
        let config = RetrieveConfig::new("http://example.org").with_header("X-Requested-With", "Custom");
        let init = init_for(config);
        let values: Vec<_> = init.headers.get_all(X_REQUESTED_WITH).iter().collect();
        assert_eq!(values, ["Custom"]);
    }

    #[test]
    fn json_inferred_for_post_without_content_type() {
        let config = RetrieveConfig::new("http://example.org")
            .with_method("POST")
            .with_data(json!({"a": 1}));
        let init = init_for(config);
        assert_eq!(content_type(&init), Some("application/json"));
        assert_eq!(init.body, Some(Payload::Text(r#"{"a":1}"#.to_string())));
    }

    #[test]
    fn json_inferred_from_explicit_content_type() {
        let config = RetrieveConfig::new("http://example.org")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_data("hello");
        let init = init_for(config);
        assert_eq!(content_type(&init), Some("application/json; charset=utf-8"));
        assert_eq!(init.body, Some(Payload::Text(r#""hello""#.to_string())));
    }

    #[test]
    fn falsy_values_are_still_data() {
        for value in [json!(null), json!(false), json!(0), json!("")] {
            let config = RetrieveConfig::new("http://example.org")
                .with_method("PUT")
                .with_data(value.clone());
            let init = init_for(config);
            assert_eq!(init.body, Some(Payload::Text(value.to_string())));
        }
    }

    #[test]
    fn get_with_object_data_is_not_json() {
        let config = RetrieveConfig::new("http://example.org").with_data(json!({"a": 1}));
        let init = init_for(config);
        assert_eq!(content_type(&init), None);
        assert_eq!(init.body, Some(Payload::Json(json!({"a": 1}))));
    }

    #[test]
    fn text_inferred_for_get_string() {
        let config = RetrieveConfig::new("http://example.org").with_data("plain");
        let init = init_for(config);
        assert_eq!(content_type(&init), Some("plain/text"));
        assert_eq!(init.body, Some(Payload::Text("plain".to_string())));
    }

    #[test]
    fn binary_types_win_over_json_content_type() {
        let config = RetrieveConfig::new("http://example.org")
            .with_method("POST")
            .with_data(Bytes::from_static(b"\x00\x01"));
        assert_eq!(content_type(&init_for(config)), Some("application/octet-stream"));

        let config = RetrieveConfig::new("http://example.org")
            .with_method("POST")
            .with_header("content-type", "application/json")
            .with_data(Blob::new("raw"));
        let init = init_for(config);
        assert_eq!(content_type(&init), Some("application/json"));
        assert_eq!(init.body, Some(Payload::Blob(Blob::new("raw"))));
    }

    #[test]
    fn form_data_removes_content_type() {
        let form = FormData::new().text("name", "value");
        let config = RetrieveConfig::new("http://example.org")
            .with_method("POST")
            .with_header("Content-Type", "application/json")
            .with_data(form.clone());
        let init = init_for(config);
        assert_eq!(content_type(&init), None);
        assert_eq!(init.body, Some(Payload::Form(form)));
    }

    #[test]
    fn content_type_merge_is_case_insensitive() {
        let config = RetrieveConfig::new("http://example.org")
            .with_method("POST")
            .with_header("content-type", "text/csv")
            .with_header("Content-Type", "text/tab-separated-values")
            .with_data("a,b");
        let init = init_for(config);
        assert_eq!(init.headers.keys_len(), 2);
        assert_eq!(init.headers.len(), 2);
        let values: Vec<_> = init.headers.get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, ["text/csv, text/tab-separated-values"]);
        assert_eq!(init.body, Some(Payload::Text("a,b".to_string())));
    }

    #[test]
    fn init_body_kept_without_data() {
        let config = RetrieveConfig::new("http://example.org")
            .with_init(Init::default().with_method("post").with_body("body"));
        let init = init_for(config);
        assert_eq!(init.body, Some(Payload::Text("body".to_string())));
        assert_eq!(content_type(&init), None);
    }

    #[test]
    fn original_init_is_untouched() {
        let config = RetrieveConfig::new("http://example.org")
            .with_method("post")
            .with_data(json!({"a": 1}));
        let _ = init_for(config.clone());
        assert_eq!(config.init.method.as_deref(), Some("post"));
        assert!(config.init.headers.is_none());
    }

    #[test]
    fn timeout_creates_signal() {
        let config = RetrieveConfig::new("http://example.org").with_timeout_ms(1000);
        assert!(init_for(config).signal.is_some());

        let config = RetrieveConfig::new("http://example.org").with_timeout(Duration::ZERO);
        assert!(init_for(config).signal.is_none());
    }

    #[test]
    fn huge_timeout_does_not_overflow() {
        let config = RetrieveConfig::new("http://example.org").with_timeout(Duration::MAX);
        let signal = init_for(config).signal.unwrap();
        assert!(!signal.is_aborted());
    }

    #[test]
    fn existing_signal_wins_over_timeout() {
        let controller = AbortController::new();
        let config = RetrieveConfig::new("http://example.org")
            .with_init(Init::default().with_signal(controller.signal()))
            .with_timeout_ms(1000);
        let init = init_for(config);
        controller.abort();
        assert!(init.signal.unwrap().is_aborted());
    }

    #[test]
    fn invalid_method_is_config_error() {
        let config = RetrieveConfig::new("http://example.org").with_method("GE T");
        assert!(matches!(build_init(&config), Err(Error::Config(_))));
    }
}
