//! Ancillary request invoker for calling routes directly.
//!
//! Tests sometimes need to hit a deployed route the way an external caller
//! would, outside the typed API client: a bare HTTP call with an optional
//! body, environment-variable-derived headers, and the response streamed
//! into a caller-supplied sink.

use std::collections::HashMap;
use std::io::Write;

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method};

use crate::error::HarnessError;

/// Issues a single HTTP call against `url`.
///
/// The method is inferred from the presence of a body (absent means GET,
/// present means POST) unless `method` overrides it. The content type is
/// always `application/json`. When `env` names variables, their current
/// values are forwarded as request headers via [`env_as_header`]. The
/// response body is streamed chunk-by-chunk into `output`; the response
/// headers are returned.
///
/// # Errors
///
/// Request construction and execution failures are wrapped with the target
/// URL for context; sink write failures surface as
/// [`HarnessError::IoError`]. Nothing here panics.
pub async fn invoke<W>(
    url: &str,
    content: Option<String>,
    method: Option<Method>,
    env: &[String],
    output: &mut W,
) -> Result<HeaderMap, HarnessError>
where
    W: Write + ?Sized,
{
    let method = method.unwrap_or(if content.is_some() {
        Method::POST
    } else {
        Method::GET
    });

    let mut request = reqwest::Client::new()
        .request(method, url)
        .header(CONTENT_TYPE, "application/json");

    if !env.is_empty() {
        request = request.headers(env_as_header(env)?);
    }
    if let Some(body) = content {
        request = request.body(body);
    }

    let mut response = request
        .send()
        .await
        .map_err(|source| HarnessError::RequestFailed {
            url: url.to_string(),
            source,
        })?;

    let headers = response.headers().clone();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| HarnessError::RequestFailed {
            url: url.to_string(),
            source,
        })?
    {
        output.write_all(&chunk)?;
    }

    Ok(headers)
}

/// Builds request headers from environment variables.
///
/// With an explicit `selected` list, exactly those variables are forwarded
/// (unset ones become empty values, everything else is ignored). With an
/// empty list, every current environment variable is forwarded.
///
/// # Errors
///
/// Fails when a variable name or value is not a valid HTTP header.
pub fn env_as_header(selected: &[String]) -> Result<HeaderMap, HarnessError> {
    headers_from_vars(std::env::vars(), selected)
}

fn headers_from_vars<I>(vars: I, selected: &[String]) -> Result<HeaderMap, HarnessError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut headers = HeaderMap::new();

    if selected.is_empty() {
        for (name, value) in vars {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(&value)?,
            );
        }
    } else {
        let lookup: HashMap<String, String> = vars.into_iter().collect();
        for name in selected {
            let value = lookup.get(name).cloned().unwrap_or_default();
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(&value)?,
            );
        }
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn test_explicit_selection_forwards_exactly_those_variables() {
        let headers = headers_from_vars(
            vars(&[("FOO", "bar"), ("OTHER", "ignored"), ("PATH", "/bin")]),
            &["FOO".to_string()],
        )
        .expect("valid headers");

        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers.get("FOO").and_then(|value| value.to_str().ok()),
            Some("bar")
        );
    }

    #[test]
    fn test_unset_selected_variable_becomes_empty_header() {
        let headers = headers_from_vars(vars(&[("FOO", "bar")]), &["MISSING".to_string()])
            .expect("valid headers");

        assert_eq!(headers.get("MISSING").and_then(|value| value.to_str().ok()), Some(""));
    }

    #[test]
    fn test_empty_selection_forwards_everything() {
        let headers = headers_from_vars(vars(&[("ONE", "1"), ("TWO", "2")]), &[])
            .expect("valid headers");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("ONE").and_then(|value| value.to_str().ok()), Some("1"));
        assert_eq!(headers.get("TWO").and_then(|value| value.to_str().ok()), Some("2"));
    }

    #[test]
    fn test_invalid_variable_name_is_an_error() {
        let result = headers_from_vars(
            vars(&[("BAD NAME", "value")]),
            &["BAD NAME".to_string()],
        );
        assert!(matches!(result, Err(HarnessError::InvalidHeaderName(_))));
    }

    #[tokio::test]
    async fn test_invoke_wraps_transport_failures() {
        let mut sink = Vec::new();
        let result = invoke("http://127.0.0.1:1/r/ghost", None, None, &[], &mut sink).await;
        assert!(matches!(result, Err(HarnessError::RequestFailed { .. })));
        assert!(sink.is_empty());
    }
}
