use serde_json::Value;
use thiserror::Error;

use crate::text::decode_text;
use crate::xml::xml_to_value;
use crate::{PayloadFormat, ProviderConfig, Row, RowPage};

/// All decode failures are transient from the engine's point of view:
/// they are retried on the shared budget, without backoff.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode payload text as {encoding}")]
    Charset { encoding: String },
    #[error("malformed {format} payload: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },
    #[error("rows path '{path}' points at a scalar value")]
    ScalarRows { path: String },
    #[error("provider echoed an error wrapper ({marker})")]
    ErrorEcho { marker: String },
}

/// Turns one raw provider response into a page of flat rows.
pub trait ResponseDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], content_type: Option<&str>) -> Result<RowPage, DecodeError>;
}

/// Path-driven decoder, configured per provider dataset instead of
/// branching on dataset codes inline.
#[derive(Debug, Clone)]
pub struct PathDecoder {
    format: PayloadFormat,
    rows_path: String,
    total_path: Option<String>,
    echo_marker: Option<String>,
}

impl PathDecoder {
    pub fn new(
        format: PayloadFormat,
        rows_path: impl Into<String>,
        total_path: Option<String>,
        echo_marker: Option<String>,
    ) -> Self {
        Self {
            format,
            rows_path: rows_path.into(),
            total_path,
            echo_marker,
        }
    }

    pub fn for_provider(provider: &ProviderConfig) -> Self {
        Self::new(
            provider.format,
            provider.rows_path.clone(),
            provider.total_path.clone(),
            provider.echo_marker.clone(),
        )
    }
}

impl ResponseDecoder for PathDecoder {
    fn decode(&self, bytes: &[u8], content_type: Option<&str>) -> Result<RowPage, DecodeError> {
        let decoded = decode_text(bytes, content_type)?;

        // Some providers wrap their errors in a 2xx body; a marker
        // substring is the reliable tell, independent of payload shape.
        if let Some(marker) = &self.echo_marker {
            if decoded.text.contains(marker.as_str()) {
                return Err(DecodeError::ErrorEcho {
                    marker: marker.clone(),
                });
            }
        }

        let value: Value = match self.format {
            PayloadFormat::Json => {
                serde_json::from_str(&decoded.text).map_err(|err| DecodeError::Malformed {
                    format: "json",
                    message: err.to_string(),
                })?
            }
            PayloadFormat::Xml => xml_to_value(&decoded.text)?,
        };

        let rows = match lookup(&value, &self.rows_path) {
            // An absent or null rows node is a clean empty page, not a
            // malformed payload; providers routinely omit it for no-data.
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(flatten_row).collect(),
            Some(single @ Value::Object(_)) => vec![flatten_row(single)],
            Some(_) => {
                return Err(DecodeError::ScalarRows {
                    path: self.rows_path.clone(),
                })
            }
        };

        let total_count = self
            .total_path
            .as_deref()
            .and_then(|path| lookup(&value, path))
            .and_then(as_count);

        Ok(RowPage { total_count, rows })
    }
}

/// Walk a dot-separated path through nested objects.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Flatten one decoded record into ordered (column, value) pairs.
/// Nested objects contribute `_`-joined column names; arrays are kept
/// verbatim as compact JSON.
fn flatten_row(value: &Value) -> Row {
    let mut row = Row::default();
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(key, nested, &mut row);
            }
        }
        other => row.0.push(("value".to_string(), scalar_text(other))),
    }
    row
}

fn flatten_into(prefix: &str, value: &Value, row: &mut Row) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(&format!("{prefix}_{key}"), nested, row);
            }
        }
        other => row.0.push((prefix.to_string(), scalar_text(other))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
