use reqwest::header::HeaderMap;
use serde_json::Value;
use stratus_core::{HeaderFields, HEADER_AUTH_KEY, HEADER_AUTH_TOKEN};

const REDACTED: &str = "***";
const SECRET_HEADERS: [&str; 2] = [HEADER_AUTH_KEY, HEADER_AUTH_TOKEN];
const SECRET_FIELDS: [&str; 2] = ["password", "apiKey"];

pub(crate) fn request_line(request: &reqwest::Request) -> String {
    let mut parts = vec![
        "curl -i".to_string(),
        format!("'{}'", request.url()),
        format!("-X {}", request.method()),
    ];
    parts.extend(header_args(request.headers()));
    if let Some(bytes) = request.body().and_then(|body| body.as_bytes()) {
        parts.push(format!("-d '{}'", redact_body(bytes)));
    }
    format!("REQ: {}", parts.join(" "))
}

pub(crate) fn response_line(status: u16, headers: &HeaderFields, text: &str) -> String {
    let headers = headers
        .iter()
        .map(|(name, value)| format!("{name}: {}", redact_header(name, value)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("RESP: [{status}] {{{headers}}}\nRESP BODY: {}", redact_body(text.as_bytes()))
}

fn header_args(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>");
            format!("-H '{}: {}'", name, redact_header(name.as_str(), value))
        })
        .collect()
}

fn redact_header<'a>(name: &str, value: &'a str) -> &'a str {
    if SECRET_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
        REDACTED
    } else {
        value
    }
}

fn redact_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if SECRET_FIELDS.contains(&key.as_str()) {
                    *inner = Value::String(REDACTED.to_string());
                } else {
                    redact_value(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_line_hides_secrets() {
        let client = reqwest::Client::new();
        let request = client
            .post("http://identity/v2.0/tokens")
            .header("X-Auth-Key", "hunter2")
            .header("Accept", "application/json")
            .json(&json!({"auth": {"passwordCredentials": {"username": "u", "password": "hunter2"}}}))
            .build()
            .expect("request");
        let line = request_line(&request);
        assert!(line.starts_with("REQ: curl -i 'http://identity/v2.0/tokens' -X POST"));
        assert!(line.contains("-H 'accept: application/json'"));
        assert!(line.contains("\"username\":\"u\""));
        assert!(!line.contains("hunter2"));
    }

    #[test]
    fn response_line_hides_token_header() {
        let mut headers = HeaderFields::new();
        headers.insert("x-auth-token".into(), "secret-token".into());
        headers.insert("x-server-management-url".into(), "http://mgmt".into());
        let line = response_line(204, &headers, "");
        assert!(line.starts_with("RESP: [204]"));
        assert!(line.contains("x-server-management-url: http://mgmt"));
        assert!(!line.contains("secret-token"));
    }

    #[test]
    fn non_json_bodies_pass_through() {
        assert_eq!(redact_body(b"plain text"), "plain text");
    }
}
