//! Batch record processor.
//!
//! Turns a request envelope into one [`OutputRecord`] per input record, in
//! input order. A failing record is reported in its own `errors` array and
//! never aborts the batch.

use crate::errors::{EnvelopeError, RecordError};
use crate::metrics_defs::RECORDS_PROCESSED;
use crate::protocol::{AddressParts, OutputRecord, ResponseEnvelope, json_kind, parse_envelope};
use serde_json::{Map, Value as JsonValue};

/// Processes a raw request body.
///
/// Only envelope-level problems are returned as errors; record-level problems
/// end up inside the returned envelope.
pub fn process(body: &[u8]) -> Result<ResponseEnvelope, EnvelopeError> {
    tracing::info!("Address Merge Skill: processing request");

    let records = match parse_envelope(body) {
        Ok(records) => records,
        Err(e) => {
            match e {
                EnvelopeError::MalformedRequest => {
                    tracing::error!("Invalid request body received")
                }
                EnvelopeError::EmptyRequest => tracing::error!("Empty request body received"),
            }
            return Err(e);
        }
    };

    if records.is_empty() {
        tracing::warn!("No values provided in the request");
    }

    let values = records.iter().map(process_record).collect();
    Ok(ResponseEnvelope { values })
}

/// Joins the fragments as `"<street> <house>, <city>"` and trims the outer whitespace.
///
/// Empty fragments are not skipped, so inner separators survive: all-empty
/// input gives `","`.
pub fn merge_address(parts: &AddressParts) -> String {
    format!(
        "{} {}, {}",
        parts.street_name, parts.house_number, parts.city
    )
    .trim()
    .to_string()
}

fn process_record(record: &JsonValue) -> OutputRecord {
    // Echoed as sent; a missing or non-string id is still reported as a record error below.
    let record_id = record
        .get("recordId")
        .cloned()
        .unwrap_or_else(|| JsonValue::String(String::new()));

    match full_address(record) {
        Ok(full_address) => {
            tracing::info!(
                record_id = %record_id,
                full_address = %full_address,
                "Successfully processed record"
            );
            shared::counter!(RECORDS_PROCESSED, "outcome" => "success").increment(1);
            OutputRecord::success(record_id, full_address)
        }
        Err(e) => {
            tracing::error!(record_id = %record_id, error = %e, "Error processing record");
            shared::counter!(RECORDS_PROCESSED, "outcome" => "error").increment(1);
            OutputRecord::failure(record_id, e.to_string())
        }
    }
}

fn full_address(record: &JsonValue) -> Result<String, RecordError> {
    let JsonValue::Object(record) = record else {
        return Err(RecordError::NotAnObject(json_kind(record)));
    };

    match record.get("recordId") {
        Some(JsonValue::String(_)) => {}
        Some(other) => return Err(RecordError::InvalidRecordId(json_kind(other))),
        None => return Err(RecordError::MissingRecordId),
    }

    let empty = Map::new();
    let data = match record.get("data") {
        None | Some(JsonValue::Null) => &empty,
        Some(JsonValue::Object(data)) => data,
        Some(other) => return Err(RecordError::InvalidData(json_kind(other))),
    };

    let parts = AddressParts::from_data(data)?;
    Ok(merge_address(&parts))
}
