//! Document source: behavioural events from a JSON-lines collection.
//!
//! The collection file holds one JSON object per line. Queries use the
//! operator filters in `query.rs`; the date bound is pushed down as
//! `{ "event_date": { "$gte": "<bound>" } }`, so a document without an
//! `event_date` never survives the filter.

use crate::{
    error::{PipelineError, PipelineResult},
    query::DocumentFilter,
    record::{Dataset, EventRecord, Field, Schema},
    relational_source::parse_date,
    source::SourceAdapter,
    types::{CustomerId, DATE_FORMAT},
};
use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

pub const DOCUMENT_SOURCE: &str = "document";

pub type Document = Map<String, Value>;

/// An opened collection: every well-formed document in file order.
pub struct DocumentCollection {
    documents: Vec<Document>,
}

impl DocumentCollection {
    /// Lines are decoded one at a time: a line that is not UTF-8 or not a
    /// JSON object is dropped on its own.
    pub fn open(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read(path).map_err(|e| {
            PipelineError::unavailable(DOCUMENT_SOURCE, format!("cannot read {}: {e}", path.display()))
        })?;

        let mut documents = Vec::new();
        for (idx, line) in content.split(|b| *b == b'\n').enumerate() {
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<Value>(line) {
                Ok(Value::Object(doc)) => documents.push(doc),
                Ok(other) => log::warn!(
                    "{DOCUMENT_SOURCE}: dropping line {}: {}",
                    idx + 1,
                    PipelineError::malformed(DOCUMENT_SOURCE, format!("not an object: {other}"))
                ),
                Err(e) => log::warn!(
                    "{DOCUMENT_SOURCE}: dropping line {}: {}",
                    idx + 1,
                    PipelineError::malformed(DOCUMENT_SOURCE, e)
                ),
            }
        }
        Ok(Self { documents })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn find<'a>(&'a self, filter: &'a DocumentFilter) -> impl Iterator<Item = &'a Document> + 'a {
        self.documents.iter().filter(move |doc| filter.matches(doc))
    }
}

/// Event schema of a query result: a field is present if any returned
/// document carries the key, even as null. An empty result gives no
/// evidence of absence, so it keeps the full schema.
pub fn observed_schema<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Schema {
    let documents: Vec<&Document> = documents.into_iter().collect();
    let mut schema = Schema::full_event();
    if documents.is_empty() {
        return schema;
    }
    for field in [Field::EventDate, Field::EventType, Field::SessionDuration] {
        if !documents.iter().any(|doc| doc.contains_key(field.name())) {
            schema.remove(field);
        }
    }
    schema
}

pub struct DocumentSource {
    path:         PathBuf,
    extra_filter: Option<Value>,
}

impl DocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:         path.into(),
            extra_filter: None,
        }
    }

    /// Additional filter clauses ANDed with the date bound.
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.extra_filter = Some(filter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The native filter document sent to the collection.
    pub fn filter_document(&self, lower_bound: NaiveDate) -> Value {
        let mut filter = match &self.extra_filter {
            Some(Value::Object(extra)) => extra.clone(),
            _ => Map::new(),
        };
        if filter.contains_key(Field::EventDate.name()) {
            log::debug!("{DOCUMENT_SOURCE}: extra event_date clause replaced by date bound");
        }
        filter.insert(
            Field::EventDate.name().to_string(),
            json!({ "$gte": lower_bound.format(DATE_FORMAT).to_string() }),
        );
        Value::Object(filter)
    }
}

impl SourceAdapter for DocumentSource {
    type Record = EventRecord;

    fn name(&self) -> &'static str {
        DOCUMENT_SOURCE
    }

    fn fetch(&self, lower_bound: NaiveDate) -> PipelineResult<Dataset<EventRecord>> {
        if let Some(extra) = &self.extra_filter {
            if !extra.is_object() {
                return Err(PipelineError::query(
                    DOCUMENT_SOURCE,
                    format!("filter must be an object, got {extra}"),
                ));
            }
        }
        let filter = DocumentFilter::parse(&self.filter_document(lower_bound))
            .map_err(|e| PipelineError::query(DOCUMENT_SOURCE, e))?;

        let collection = DocumentCollection::open(&self.path)?;

        let mut rows = Vec::new();
        let mut kept = Vec::new();
        for doc in collection.find(&filter) {
            match normalize_document(doc) {
                Ok(record) => {
                    rows.push(record);
                    kept.push(doc);
                }
                Err(e) => log::warn!("{DOCUMENT_SOURCE}: dropping document: {e}"),
            }
        }
        let schema = observed_schema(kept);

        log::info!(
            "{DOCUMENT_SOURCE}: fetched {} of {} events on or after {lower_bound}",
            rows.len(),
            collection.len()
        );
        Ok(Dataset::new(schema, rows))
    }
}

/// Map one document onto an `EventRecord`. Only `customer_id` is required.
pub fn normalize_document(doc: &Document) -> PipelineResult<EventRecord> {
    let customer_id = match doc.get(Field::CustomerId.name()) {
        Some(v) => as_customer_id(v)
            .ok_or_else(|| malformed(format!("customer_id is not an integer: {v}")))?,
        None => return Err(malformed("missing customer_id")),
    };

    let event_date = match doc.get(Field::EventDate.name()) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(
            parse_date(s).ok_or_else(|| malformed(format!("event_date '{s}' is not a calendar date")))?,
        ),
        Some(other) => return Err(malformed(format!("event_date is not a string: {other}"))),
    };

    let event_type = match doc.get(Field::EventType.name()) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => return Err(malformed(format!("event_type is not a string: {other}"))),
    };

    let session_duration = match doc.get(Field::SessionDuration.name()) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(
            n.as_f64()
                .filter(|d| d.is_finite())
                .ok_or_else(|| malformed(format!("session_duration out of range: {n}")))?,
        ),
        Some(other) => return Err(malformed(format!("session_duration is not numeric: {other}"))),
    };

    Ok(EventRecord {
        customer_id,
        event_date,
        event_type,
        session_duration,
    })
}

fn as_customer_id(v: &Value) -> Option<CustomerId> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
}

fn malformed(reason: impl ToString) -> PipelineError {
    PipelineError::malformed(DOCUMENT_SOURCE, reason)
}
