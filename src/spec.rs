//! Spec normalizer: turns untrusted chart requests into canonical specs
//!
//! The wire format is loose by design (several historical clients are still in
//! the wild), so `data` arrives as raw JSON and is shaped here rather than by
//! serde derives. Three shapes are accepted:
//!
//! - `[{"x": .., "y": ..}, ..]` point objects
//! - `{"labels": [..], "values": [..]}` columns
//! - `{"x": [..], "y": [..]}` parallel arrays
//!
//! Some clients nest `title`/`xlabel`/`ylabel`/`referenceLines` inside the
//! `data` object instead of (or as well as) the top level; both spellings are
//! honored, with the top-level field winning on conflict. Everything else is
//! rejected with a `Validation` error before any rendering resource is
//! acquired.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// The closed set of supported series primitives.
///
/// This is deliberately a tagged enum rather than anything caller-extensible:
/// the service never executes caller-supplied rendering logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
}

impl FromStr for ChartKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            "scatter" => Ok(ChartKind::Scatter),
            other => Err(Error::Validation(format!(
                "unsupported chart type: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Line => write!(f, "line"),
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Scatter => write!(f, "scatter"),
        }
    }
}

/// An x coordinate: numeric for continuous domains, a label for categorical ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Number(f64),
    Label(String),
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord::Number(n) => write!(f, "{n}"),
            Coord::Label(s) => write!(f, "{s}"),
        }
    }
}

/// One data point of the canonical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: f64,
}

/// A labeled horizontal reference line overlaid on the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub value: f64,
    pub label: String,
}

/// Untrusted request body for `POST /render-chart`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartRequest {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data: Value,
    #[serde(default)]
    pub xlabel: Option<String>,
    #[serde(default)]
    pub ylabel: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Insertion order of the JSON object is preserved and carried through to
    /// the scene, so overlay stacking is deterministic.
    #[serde(rename = "referenceLines", default)]
    pub reference_lines: Option<IndexMap<String, Value>>,
}

/// Canonical, validated description of one chart to render.
///
/// Immutable once built; rendering is a pure function of this value, so
/// callers may retry failed renders idempotently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub points: Vec<Point>,
    pub xlabel: String,
    pub ylabel: String,
    pub title: String,
    pub reference_lines: Vec<ReferenceLine>,
}

/// Normalize an untrusted request into a canonical spec.
///
/// Pure and total over the documented input shapes; fails fast with
/// `Error::Validation` before any session exists.
pub fn normalize(request: &ChartRequest) -> Result<ChartSpec> {
    let kind = request.chart_type.parse::<ChartKind>()?;
    let nested = nested_meta(&request.data)?;
    let points = normalize_points(&request.data)?;
    if points.is_empty() {
        return Err(Error::Validation(
            "chart needs at least one data point".into(),
        ));
    }

    let reference_lines = match request
        .reference_lines
        .as_ref()
        .or(nested.reference_lines.as_ref())
    {
        Some(entries) => normalize_reference_lines(entries)?,
        None => Vec::new(),
    };

    Ok(ChartSpec {
        kind,
        points,
        xlabel: request
            .xlabel
            .clone()
            .or(nested.xlabel)
            .unwrap_or_else(|| "X Axis".to_string()),
        ylabel: request
            .ylabel
            .clone()
            .or(nested.ylabel)
            .unwrap_or_else(|| "Y Axis".to_string()),
        title: request
            .title
            .clone()
            .or(nested.title)
            .unwrap_or_else(|| "Graph".to_string()),
        reference_lines,
    })
}

/// Captions and reference lines carried inside the `data` object itself.
#[derive(Default)]
struct NestedMeta {
    xlabel: Option<String>,
    ylabel: Option<String>,
    title: Option<String>,
    reference_lines: Option<IndexMap<String, Value>>,
}

fn nested_meta(data: &Value) -> Result<NestedMeta> {
    let Value::Object(fields) = data else {
        return Ok(NestedMeta::default());
    };

    let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
    let reference_lines = match fields.get("referenceLines") {
        None | Some(Value::Null) => None,
        Some(value) => Some(serde_json::from_value(value.clone()).map_err(|_| {
            Error::Validation("malformed `referenceLines` inside data".into())
        })?),
    };

    Ok(NestedMeta {
        xlabel: text("xlabel"),
        ylabel: text("ylabel"),
        title: text("title"),
        reference_lines,
    })
}

#[derive(Deserialize)]
struct RawPoint {
    #[serde(default)]
    x: Option<Coord>,
    #[serde(default)]
    y: Option<f64>,
}

fn normalize_points(data: &Value) -> Result<Vec<Point>> {
    match data {
        Value::Array(items) => items.iter().map(parse_point).collect(),
        Value::Object(fields) => {
            if fields.contains_key("labels") && fields.contains_key("values") {
                let labels: Vec<Coord> = parse_column(&fields["labels"], "labels")?;
                let values: Vec<f64> = parse_column(&fields["values"], "values")?;
                zip_columns(labels, values, "labels/values")
            } else if fields.contains_key("x") && fields.contains_key("y") {
                let xs: Vec<Coord> = parse_column(&fields["x"], "x")?;
                let ys: Vec<f64> = parse_column(&fields["y"], "y")?;
                zip_columns(xs, ys, "x/y")
            } else {
                Err(Error::Validation("unrecognized data shape".into()))
            }
        }
        _ => Err(Error::Validation("unrecognized data shape".into())),
    }
}

fn parse_point(item: &Value) -> Result<Point> {
    let raw: RawPoint = serde_json::from_value(item.clone())
        .map_err(|_| Error::Validation("malformed point".into()))?;
    match (raw.x, raw.y) {
        (Some(x), Some(y)) => Ok(Point { x, y }),
        _ => Err(Error::Validation("malformed point".into())),
    }
}

fn parse_column<T: serde::de::DeserializeOwned>(value: &Value, name: &str) -> Result<Vec<T>> {
    serde_json::from_value(value.clone())
        .map_err(|_| Error::Validation(format!("malformed `{name}` column")))
}

fn zip_columns(xs: Vec<Coord>, ys: Vec<f64>, shape: &str) -> Result<Vec<Point>> {
    if xs.len() != ys.len() {
        return Err(Error::Validation(format!(
            "{shape} length mismatch: {} vs {}",
            xs.len(),
            ys.len()
        )));
    }
    Ok(xs
        .into_iter()
        .zip(ys)
        .map(|(x, y)| Point { x, y })
        .collect())
}

fn normalize_reference_lines(entries: &IndexMap<String, Value>) -> Result<Vec<ReferenceLine>> {
    let malformed = |name: &str| Error::Validation(format!("malformed reference line `{name}`"));

    entries
        .iter()
        .map(|(name, entry)| match entry {
            Value::Number(n) => n
                .as_f64()
                .map(|value| ReferenceLine {
                    value,
                    label: name.clone(),
                })
                .ok_or_else(|| malformed(name)),
            Value::Object(fields) => {
                let value = fields
                    .get("value")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| malformed(name))?;
                let label = match fields.get("label") {
                    None | Some(Value::Null) => name.clone(),
                    Some(Value::String(s)) => s.clone(),
                    Some(_) => return Err(malformed(name)),
                };
                Ok(ReferenceLine { value, label })
            }
            // Two-element range arrays have shown up in the wild but their
            // meaning (one boundary or two lines?) is unsettled, so they are
            // rejected rather than guessed at.
            _ => Err(malformed(name)),
        })
        .collect()
}
