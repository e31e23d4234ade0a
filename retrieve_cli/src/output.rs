use retrieve::{Envelope, Error, FormValue, ResponseData};
use serde_json::{json, Map, Value};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Tabled)]
struct HeaderRow {
    #[tabled(rename = "Header")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn build_header_rows(envelope: &Envelope) -> Vec<HeaderRow> {
    envelope
        .response
        .headers()
        .iter()
        .map(|(name, value)| HeaderRow {
            name: name.as_str().to_string(),
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        })
        .collect()
}

fn form_value_to_json(value: &FormValue) -> Value {
    match value {
        FormValue::Text(text) => Value::String(text.clone()),
        FormValue::File { blob, file_name } => json!({
            "fileName": file_name,
            "type": blob.mime_type(),
            "size": blob.len(),
        }),
    }
}

fn data_to_json(data: Option<&ResponseData>) -> Value {
    match data {
        Some(ResponseData::Json(value)) => value.clone(),
        Some(ResponseData::Text(text)) => Value::String(text.clone()),
        Some(ResponseData::Form(form)) => form
            .entries()
            .iter()
            .map(|(name, value)| json!({"name": name, "value": form_value_to_json(value)}))
            .collect(),
        None => Value::Null,
    }
}

/// Machine-readable view of an envelope.
pub fn envelope_to_json(envelope: &Envelope) -> Value {
    let headers: Map<String, Value> = build_header_rows(envelope)
        .into_iter()
        .map(|row| (row.name, Value::String(row.value)))
        .collect();
    json!({
        "status": envelope.status(),
        "statusText": envelope.response.status_text(),
        "url": envelope.response.url().map(|url| url.as_str()),
        "headers": headers,
        "data": data_to_json(envelope.data.as_ref()),
    })
}

pub fn render_text(envelope: &Envelope) -> String {
    let mut out = format!(
        "HTTP {} {}\n",
        envelope.status(),
        envelope.response.status_text()
    );

    let rows = build_header_rows(envelope);
    if !rows.is_empty() {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        out.push_str(&table.to_string());
        out.push('\n');
    }

    match &envelope.data {
        Some(ResponseData::Json(value)) => {
            out.push('\n');
            out.push_str(&serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()));
            out.push('\n');
        }
        Some(ResponseData::Text(text)) => {
            out.push('\n');
            out.push_str(text);
            out.push('\n');
        }
        Some(ResponseData::Form(form)) => {
            out.push('\n');
            for (name, value) in form.entries() {
                out.push_str(&format!("{}: {}\n", name, form_value_to_json(value)));
            }
        }
        None => {}
    }
    out
}

pub fn render_error(err: &Error) -> String {
    match err {
        Error::Request(e) => match e.cause() {
            Some(cause) if cause != e.message() => {
                format!("error: {}\n  caused by: {}", e.message(), cause)
            }
            _ => format!("error: {}", e.message()),
        },
        Error::Response(e) => match e.data() {
            Some(data) => format!(
                "error: {}\n{}",
                e.message(),
                serde_json::to_string_pretty(&data_to_json(Some(data))).unwrap_or_default()
            ),
            None => format!("error: {}", e.message()),
        },
        other => format!("error: {}", other),
    }
}

pub fn print_envelope(envelope: &Envelope, format: &OutputFormat) {
    match format {
        OutputFormat::Text => print!("{}", render_text(envelope)),
        OutputFormat::Json => match serde_json::to_string_pretty(&envelope_to_json(envelope)) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use retrieve::{Blob, FormData, Response};

    use super::*;

    fn envelope(data: Option<ResponseData>) -> Envelope {
        Envelope {
            response: Response::from_json(200, &json!({})),
            data,
        }
    }

    #[test]
    fn json_view_of_json_envelope() {
        let value = envelope_to_json(&envelope(Some(ResponseData::Json(json!({"id": 7})))));
        assert_eq!(value["status"], 200);
        assert_eq!(value["statusText"], "OK");
        assert_eq!(value["url"], Value::Null);
        assert_eq!(value["headers"]["content-type"], "application/json");
        assert_eq!(value["data"], json!({"id": 7}));
    }

    #[test]
    fn json_view_of_form_envelope() {
        let form = FormData::new()
            .text("name", "Widget")
            .file("logo", Blob::new(vec![1, 2, 3]).with_type("image/png"), Some("logo.png"));
        let value = envelope_to_json(&envelope(Some(ResponseData::Form(form))));
        assert_eq!(
            value["data"],
            json!([
                {"name": "name", "value": "Widget"},
                {"name": "logo", "value": {"fileName": "logo.png", "type": "image/png", "size": 3}},
            ])
        );
    }

    #[test]
    fn text_view_has_status_headers_and_body() {
        let text = render_text(&envelope(Some(ResponseData::Text("hello".to_string()))));
        assert!(text.starts_with("HTTP 200 OK\n"));
        assert!(text.contains("Header"));
        assert!(text.contains("content-type"));
        assert!(text.ends_with("\nhello\n"));
    }

    #[test]
    fn text_view_without_data() {
        let text = render_text(&envelope(None));
        assert!(text.starts_with("HTTP 200 OK\n"));
        assert!(text.ends_with("╯\n"));
    }

    #[test]
    fn renders_errors() {
        let err = Error::Request(
            retrieve::RequestError::new("connection refused").with_message("Service unreachable"),
        );
        assert_eq!(render_error(&err), "error: Service unreachable");

        let err = Error::Config("relative url `/x` needs a base url".to_string());
        assert_eq!(
            render_error(&err),
            "error: Invalid request configuration: relative url `/x` needs a base url"
        );
    }
}
