//! Wire types for the custom skill protocol spoken by the indexing pipeline.
//!
//! Request:
//! ```json
//! {
//!   "values": [
//!     {
//!       "recordId": "1",
//!       "data": {"streetName": "Main Street", "houseNumber": "123B", "city": "New York"}
//!     }
//!   ]
//! }
//! ```
//!
//! Response:
//! ```json
//! {
//!   "values": [
//!     {
//!       "recordId": "1",
//!       "data": {"fullAddress": "Main Street 123B, New York"},
//!       "errors": null,
//!       "warnings": null
//!     }
//!   ]
//! }
//! ```

use crate::errors::{AddressMergeError, EnvelopeError, RecordError};
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use shared::http::full_body;

pub type HandlerBody = BoxBody<Bytes, AddressMergeError>;

/// Parses a raw request body and returns the records of its `values` member.
///
/// Records are returned as raw JSON so that a malformed record fails on its own
/// instead of failing the whole batch.
pub fn parse_envelope(body: &[u8]) -> Result<Vec<JsonValue>, EnvelopeError> {
    let parsed: JsonValue =
        serde_json::from_slice(body).map_err(|_| EnvelopeError::MalformedRequest)?;

    if is_empty_value(&parsed) {
        return Err(EnvelopeError::EmptyRequest);
    }

    let JsonValue::Object(mut envelope) = parsed else {
        return Err(EnvelopeError::MalformedRequest);
    };

    match envelope.remove("values") {
        None => Ok(Vec::new()),
        Some(values) if is_empty_value(&values) => Ok(Vec::new()),
        Some(JsonValue::Array(values)) => Ok(values),
        Some(_) => Err(EnvelopeError::MalformedRequest),
    }
}

/// `null`, `false`, zero, and empty strings, arrays and objects.
fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
    }
}

/// Name of the JSON type of `value`, used in record error messages.
pub fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Address fragments of one input record. Every field defaults to `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub street_name: String,
    pub house_number: String,
    pub city: String,
}

impl AddressParts {
    pub fn from_data(data: &Map<String, JsonValue>) -> Result<Self, RecordError> {
        Ok(Self {
            street_name: string_field(data, "streetName")?,
            house_number: string_field(data, "houseNumber")?,
            city: string_field(data, "city")?,
        })
    }
}

fn string_field(
    data: &Map<String, JsonValue>,
    field: &'static str,
) -> Result<String, RecordError> {
    match data.get(field) {
        None | Some(JsonValue::Null) => Ok(String::new()),
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(other) => Err(RecordError::InvalidField {
            field,
            found: json_kind(other),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordMessage {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputData {
    #[serde(rename = "fullAddress")]
    pub full_address: Option<String>,
}

/// One entry of the response `values` array.
///
/// `recordId` is echoed exactly as received, whatever its JSON type.
/// `errors` and `warnings` are serialized as `null` rather than omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    #[serde(rename = "recordId")]
    pub record_id: JsonValue,
    pub data: OutputData,
    pub errors: Option<Vec<RecordMessage>>,
    pub warnings: Option<Vec<RecordMessage>>,
}

impl OutputRecord {
    pub fn success(record_id: JsonValue, full_address: String) -> Self {
        Self {
            record_id,
            data: OutputData {
                full_address: Some(full_address),
            },
            errors: None,
            warnings: None,
        }
    }

    pub fn failure(record_id: JsonValue, message: String) -> Self {
        Self {
            record_id,
            data: OutputData { full_address: None },
            errors: Some(vec![RecordMessage { message }]),
            warnings: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseEnvelope {
    pub values: Vec<OutputRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&EnvelopeError> for ErrorBody {
    fn from(err: &EnvelopeError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

impl From<StatusCode> for ErrorBody {
    fn from(status: StatusCode) -> Self {
        Self {
            error: status
                .canonical_reason()
                .unwrap_or("an error occurred")
                .to_string(),
        }
    }
}

/// Serializes `value` into a JSON response with the given status.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
) -> Result<Response<HandlerBody>, AddressMergeError> {
    let bytes = serde_json::to_vec(value)?;

    let mut response = Response::new(full_body(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}
