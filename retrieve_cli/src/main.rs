mod output;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use retrieve::{handler, Payload, RetrieveConfig};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "retrieve")]
#[command(about = "Send a single HTTP request and print the decoded response")]
struct Cli {
    /// Absolute URL, or a path resolved against the base URL
    url: String,

    /// Base URL for relative paths [env: RETRIEVE_BASE_URL]
    #[arg(long)]
    base_url: Option<String>,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    method: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "param", short = 'p', value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Request header as name:value (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Request body. Sent as JSON if it parses as JSON, otherwise as text
    #[arg(long, short = 'd')]
    data: Option<String>,

    /// Timeout in milliseconds, 0 disables it [env: RETRIEVE_TIMEOUT_MS]
    #[arg(long)]
    timeout: Option<u64>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    output: String,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected name:value, got `{}`", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{}`", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_data(data: &str) -> Payload {
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(value) => Payload::Json(value),
        Err(_) => Payload::Text(data.to_string()),
    }
}

fn build_config(cli: &Cli) -> Result<RetrieveConfig> {
    let mut config = RetrieveConfig::new(&cli.url).with_method(&cli.method);

    if let Some(base_url) = cli
        .base_url
        .clone()
        .or_else(|| std::env::var("RETRIEVE_BASE_URL").ok())
    {
        config = config.with_base_url(base_url);
    }

    let timeout = match cli.timeout {
        Some(ms) => Some(ms),
        None => match std::env::var("RETRIEVE_TIMEOUT_MS") {
            Ok(ms) => Some(
                ms.trim()
                    .parse::<u64>()
                    .with_context(|| format!("invalid RETRIEVE_TIMEOUT_MS `{}`", ms))?,
            ),
            Err(_) => None,
        },
    };
    if let Some(ms) = timeout {
        config = config.with_timeout(Duration::from_millis(ms));
    }

    if !cli.params.is_empty() {
        config = config.with_params(cli.params.iter().cloned());
    }
    for (name, value) in &cli.headers {
        config = config.with_header(name, value);
    }
    if let Some(data) = &cli.data {
        config = config.with_data(parse_data(data));
    }

    Ok(config.with_before_request_handler(handler::before_request(|url, init| async move {
        tracing::info!(method = %init.method, url = %url, "Sending request");
        Ok((url, init))
    })))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("retrieve=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Text,
    };

    let config = build_config(&cli)?;
    match retrieve::retrieve(&config).await {
        Ok(envelope) => {
            output::print_envelope(&envelope, &format);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", output::render_error(&err));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("retrieve").chain(args.iter().copied()))
    }

    #[test]
    fn parses_repeated_params_and_headers() {
        let cli = cli(&[
            "/items",
            "--param",
            "q=widgets",
            "-p",
            "empty=",
            "-H",
            "Accept: application/json",
            "--header",
            "X-Trace:abc",
        ]);
        assert_eq!(
            cli.params,
            [
                ("q".to_string(), "widgets".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );
        assert_eq!(
            cli.headers,
            [
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Trace".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_param() {
        assert!(Cli::try_parse_from(["retrieve", "/items", "--param", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["retrieve", "/items", "-H", ":value"]).is_err());
    }

    #[test]
    fn data_is_json_when_it_parses() {
        assert_eq!(parse_data(r#"{"a":1}"#), Payload::Json(serde_json::json!({"a": 1})));
        assert_eq!(parse_data("42"), Payload::Json(serde_json::json!(42)));
        assert_eq!(parse_data("hello"), Payload::Text("hello".to_string()));
    }

    #[test]
    fn builds_config_from_flags() {
        let cli = cli(&[
            "http://example.org/items",
            "-X",
            "post",
            "--timeout",
            "250",
            "-p",
            "page=2",
            "-d",
            r#"{"name":"Widget"}"#,
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.url, "http://example.org/items");
        assert_eq!(config.init.method.as_deref(), Some("post"));
        assert_eq!(config.timeout, Some(Duration::from_millis(250)));
        assert_eq!(
            config.params,
            Some(vec![("page".to_string(), "2".to_string())])
        );
        assert_eq!(
            config.data,
            Some(Payload::Json(serde_json::json!({"name": "Widget"})))
        );
        assert_eq!(config.before_request_handlers.len(), 1);
    }
}
