//! Exchange form of a document for storage and transfer.
//!
//! # Responsibility
//! - Serialize a `Document` into plain structured data (maps, sequences,
//!   strings, numbers, booleans).
//! - Rebuild a `Document` from that data, rejecting malformed input as a
//!   whole.
//!
//! # Invariants
//! - `deserialize(&serialize(d)) == d` for every document in normal form.
//! - Deserialization never returns a partially built document.
//! - False flags and left alignment are omitted on output and defaulted on
//!   input.
//!
//! # Wire shape
//! ```json
//! {"version":1,"blocks":[{"type":"heading","level":2,"align":"center",
//!   "runs":[{"text":"Hello","bold":true}]}]}
//! ```

use crate::model::document::{
    Alignment, Block, BlockKind, Document, FormatFlag, FormatSet, HeadingLevel, TextRun,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod render;

pub use render::{derive_preview_text, render_html};

/// Wire format version emitted by [`serialize`].
pub const EXCHANGE_VERSION: u64 = 1;

const ROOT_FIELDS: &[&str] = &["version", "blocks"];
const PARAGRAPH_FIELDS: &[&str] = &["type", "align", "runs"];
const HEADING_FIELDS: &[&str] = &["type", "level", "align", "runs"];
const RUN_FIELDS: &[&str] = &["text", "bold", "italic", "underline", "strikethrough"];

/// Immutable structured-data value produced by [`serialize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeForm(Value);

impl ExchangeForm {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Compact JSON text used for storage.
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }

    /// Parses JSON text; syntax errors are reported as malformed documents.
    pub fn from_json_str(raw: &str) -> Result<Self, MalformedDocument> {
        serde_json::from_str(raw)
            .map(Self)
            .map_err(|err| MalformedDocument::new("$", format!("invalid JSON: {err}")))
    }

    /// `true` for values that carry no content at all: `null`, `""`, `{}`
    /// or `[]`.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::String(text) => text.trim().is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// Exchange input failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedDocument {
    /// JSON-path-like location of the offending value.
    pub path: String,
    pub reason: String,
}

impl MalformedDocument {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl Display for MalformedDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed document at {}: {}", self.path, self.reason)
    }
}

impl Error for MalformedDocument {}

/// Serializes every block and run in order.
pub fn serialize(document: &Document) -> ExchangeForm {
    let blocks = document.blocks().iter().map(block_to_value).collect();
    let mut root = Map::new();
    root.insert("version".to_string(), Value::from(EXCHANGE_VERSION));
    root.insert("blocks".to_string(), Value::Array(blocks));
    ExchangeForm(Value::Object(root))
}

/// Rebuilds a document from its exchange form.
///
/// # Errors
/// Returns `MalformedDocument` for a non-object root, missing required
/// fields, unknown fields, unknown block types or alignments, non-integer
/// heading levels, non-boolean flags, or an unsupported `version`.
/// Integer heading levels outside `1..=6` are coerced to 1.
pub fn deserialize(form: &ExchangeForm) -> Result<Document, MalformedDocument> {
    let root = expect_object(form.as_value(), "$")?;
    reject_unknown_fields(root, "$", ROOT_FIELDS)?;

    if let Some(version) = root.get("version") {
        match version.as_u64() {
            Some(value) if (1..=EXCHANGE_VERSION).contains(&value) => {}
            Some(value) => {
                return Err(MalformedDocument::new(
                    "$.version",
                    format!("unsupported version {value}; latest supported is {EXCHANGE_VERSION}"),
                ));
            }
            None => {
                return Err(MalformedDocument::new(
                    "$.version",
                    "expected a positive integer",
                ));
            }
        }
    }

    let blocks = root
        .get("blocks")
        .ok_or_else(|| MalformedDocument::new("$.blocks", "missing required field"))?
        .as_array()
        .ok_or_else(|| MalformedDocument::new("$.blocks", "expected an array"))?;

    let mut parsed = Vec::with_capacity(blocks.len());
    for (index, value) in blocks.iter().enumerate() {
        parsed.push(parse_block(value, &format!("$.blocks[{index}]"))?);
    }

    Ok(Document::from_blocks(parsed))
}

fn block_to_value(block: &Block) -> Value {
    let mut map = Map::new();
    match block.kind() {
        BlockKind::Paragraph => {
            map.insert("type".to_string(), Value::from("paragraph"));
        }
        BlockKind::Heading(level) => {
            map.insert("type".to_string(), Value::from("heading"));
            map.insert("level".to_string(), Value::from(level.get()));
        }
    }
    if block.align() != Alignment::Left {
        map.insert("align".to_string(), Value::from(block.align().as_str()));
    }
    let runs = block.runs().iter().map(run_to_value).collect();
    map.insert("runs".to_string(), Value::Array(runs));
    Value::Object(map)
}

fn run_to_value(run: &TextRun) -> Value {
    let mut map = Map::new();
    map.insert("text".to_string(), Value::from(run.text.as_str()));
    for flag in FormatFlag::ALL {
        if run.format.contains(flag) {
            map.insert(flag.as_str().to_string(), Value::Bool(true));
        }
    }
    Value::Object(map)
}

fn parse_block(value: &Value, path: &str) -> Result<Block, MalformedDocument> {
    let map = expect_object(value, path)?;
    let type_name = map
        .get("type")
        .ok_or_else(|| MalformedDocument::new(format!("{path}.type"), "missing required field"))?
        .as_str()
        .ok_or_else(|| MalformedDocument::new(format!("{path}.type"), "expected a string"))?;

    let kind = match type_name {
        "paragraph" => {
            reject_unknown_fields(map, path, PARAGRAPH_FIELDS)?;
            BlockKind::Paragraph
        }
        "heading" => {
            reject_unknown_fields(map, path, HEADING_FIELDS)?;
            let raw = map.get("level").ok_or_else(|| {
                MalformedDocument::new(format!("{path}.level"), "missing required field")
            })?;
            // Integers past i64::MAX are out of range like any other.
            let level = raw
                .as_i64()
                .or_else(|| raw.as_u64().map(|_| i64::MAX))
                .ok_or_else(|| {
                    MalformedDocument::new(format!("{path}.level"), "expected an integer")
                })?;
            BlockKind::Heading(HeadingLevel::coerce(level))
        }
        other => {
            return Err(MalformedDocument::new(
                format!("{path}.type"),
                format!("unknown block type `{other}`"),
            ));
        }
    };

    let align = match map.get("align") {
        None => Alignment::Left,
        Some(Value::String(name)) => name.parse::<Alignment>().map_err(|err| {
            MalformedDocument::new(format!("{path}.align"), err.to_string())
        })?,
        Some(_) => {
            return Err(MalformedDocument::new(
                format!("{path}.align"),
                "expected a string",
            ));
        }
    };

    let runs_path = format!("{path}.runs");
    let runs = map
        .get("runs")
        .ok_or_else(|| MalformedDocument::new(runs_path.as_str(), "missing required field"))?
        .as_array()
        .ok_or_else(|| MalformedDocument::new(runs_path.as_str(), "expected an array"))?;

    let mut parsed = Vec::with_capacity(runs.len());
    for (index, run) in runs.iter().enumerate() {
        parsed.push(parse_run(run, &format!("{runs_path}[{index}]"))?);
    }

    Ok(Block::with_runs(kind, parsed).aligned(align))
}

fn parse_run(value: &Value, path: &str) -> Result<TextRun, MalformedDocument> {
    let map = expect_object(value, path)?;
    reject_unknown_fields(map, path, RUN_FIELDS)?;

    let text = map
        .get("text")
        .ok_or_else(|| MalformedDocument::new(format!("{path}.text"), "missing required field"))?
        .as_str()
        .ok_or_else(|| MalformedDocument::new(format!("{path}.text"), "expected a string"))?;

    let mut format = FormatSet::PLAIN;
    for flag in FormatFlag::ALL {
        match map.get(flag.as_str()) {
            None => {}
            Some(Value::Bool(enabled)) => format.set(flag, *enabled),
            Some(_) => {
                return Err(MalformedDocument::new(
                    format!("{path}.{}", flag.as_str()),
                    "expected a boolean",
                ));
            }
        }
    }

    Ok(TextRun::new(text, format))
}

fn expect_object<'v>(value: &'v Value, path: &str) -> Result<&'v Map<String, Value>, MalformedDocument> {
    value
        .as_object()
        .ok_or_else(|| MalformedDocument::new(path, "expected an object"))
}

fn reject_unknown_fields(
    map: &Map<String, Value>,
    path: &str,
    allowed: &[&str],
) -> Result<(), MalformedDocument> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(MalformedDocument::new(
            format!("{path}.{key}"),
            "unknown field",
        )),
        None => Ok(()),
    }
}
