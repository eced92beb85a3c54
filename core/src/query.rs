//! Document filter language.
//!
//! A filter is a JSON object. Each key names a document field and maps
//! either to a literal (equality) or to an operator object:
//!
//! ```json
//! { "event_date": { "$gte": "2025-01-01" }, "event_type": "login" }
//! ```
//!
//! All clauses must hold. A field the document does not carry never
//! satisfies a clause, `$ne` included.

use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "$eq"  => Some(CompareOp::Eq),
            "$ne"  => Some(CompareOp::Ne),
            "$gt"  => Some(CompareOp::Gt),
            "$gte" => Some(CompareOp::Gte),
            "$lt"  => Some(CompareOp::Lt),
            "$lte" => Some(CompareOp::Lte),
            _      => None,
        }
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq  => ord == Ordering::Equal,
            CompareOp::Ne  => ord != Ordering::Equal,
            CompareOp::Gt  => ord == Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
            CompareOp::Lt  => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field:   String,
    pub op:      CompareOp,
    pub operand: Value,
}

/// A parsed conjunction of field clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    clauses: Vec<Clause>,
}

impl DocumentFilter {
    /// The filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// `{ field: { "$gte": operand } }`
    pub fn gte(field: &str, operand: impl Into<Value>) -> Self {
        Self {
            clauses: vec![Clause {
                field:   field.to_string(),
                op:      CompareOp::Gte,
                operand: operand.into(),
            }],
        }
    }

    pub fn parse(filter: &Value) -> Result<Self, String> {
        let obj = filter
            .as_object()
            .ok_or_else(|| format!("filter must be an object, got {filter}"))?;

        let mut clauses = Vec::new();
        for (field, condition) in obj {
            if field.starts_with('$') {
                return Err(format!("unsupported top-level operator '{field}'"));
            }
            match condition {
                Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                    for (token, operand) in ops {
                        let op = CompareOp::parse(token)
                            .ok_or_else(|| format!("unsupported operator '{token}' on '{field}'"))?;
                        if operand.is_object() || operand.is_array() {
                            return Err(format!("operand of '{token}' on '{field}' must be a scalar"));
                        }
                        clauses.push(Clause {
                            field: field.clone(),
                            op,
                            operand: operand.clone(),
                        });
                    }
                }
                Value::Object(_) | Value::Array(_) => {
                    return Err(format!("equality on '{field}' must use a scalar"));
                }
                literal => clauses.push(Clause {
                    field:   field.clone(),
                    op:      CompareOp::Eq,
                    operand: literal.clone(),
                }),
            }
        }
        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        self.clauses.iter().all(|clause| {
            match doc.get(&clause.field) {
                None | Some(Value::Null) => false,
                Some(value) => compare(value, &clause.operand)
                    .map(|ord| clause.op.accepts(ord))
                    .unwrap_or(false),
            }
        })
    }
}

/// Values of different types are not comparable; such clauses never match.
fn compare(value: &Value, operand: &Value) -> Option<Ordering> {
    match (value, operand) {
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
