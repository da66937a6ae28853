//! Property tests for the spec normalizer

use indexmap::IndexMap;
use proptest::prelude::*;
use serde_json::{json, Value};

use chartshot::spec::{normalize, ChartKind, ChartRequest, ChartSpec, Coord};

/// Project a canonical spec back into the request wire shape.
fn to_request_shape(spec: &ChartSpec) -> ChartRequest {
    let data: Vec<Value> = spec
        .points
        .iter()
        .map(|p| {
            let x = match &p.x {
                Coord::Number(n) => json!(n),
                Coord::Label(s) => json!(s),
            };
            json!({"x": x, "y": p.y})
        })
        .collect();

    let reference_lines = if spec.reference_lines.is_empty() {
        None
    } else {
        Some(
            spec.reference_lines
                .iter()
                .map(|r| {
                    (
                        r.label.clone(),
                        json!({"value": r.value, "label": r.label}),
                    )
                })
                .collect::<IndexMap<String, Value>>(),
        )
    };

    ChartRequest {
        chart_type: spec.kind.to_string(),
        data: Value::Array(data),
        xlabel: Some(spec.xlabel.clone()),
        ylabel: Some(spec.ylabel.clone()),
        title: Some(spec.title.clone()),
        reference_lines,
    }
}

fn kind_strategy() -> impl Strategy<Value = ChartKind> {
    prop_oneof![
        Just(ChartKind::Line),
        Just(ChartKind::Bar),
        Just(ChartKind::Scatter),
    ]
}

fn coord_strategy() -> impl Strategy<Value = Coord> {
    prop_oneof![
        (-1e6f64..1e6f64).prop_map(Coord::Number),
        "[a-zA-Z0-9 ]{1,12}".prop_map(Coord::Label),
    ]
}

fn request_strategy() -> impl Strategy<Value = ChartRequest> {
    (
        kind_strategy(),
        prop::collection::vec((coord_strategy(), -1e6f64..1e6f64), 1..16),
        // Unique keys, bare-number entries; labels default to the keys
        prop::collection::hash_map("[a-z]{1,8}", -1e6f64..1e6f64, 0..4),
    )
        .prop_map(|(kind, points, refs)| {
            let data: Vec<Value> = points
                .iter()
                .map(|(x, y)| {
                    let x = match x {
                        Coord::Number(n) => json!(n),
                        Coord::Label(s) => json!(s),
                    };
                    json!({"x": x, "y": y})
                })
                .collect();
            let reference_lines = if refs.is_empty() {
                None
            } else {
                Some(
                    refs.into_iter()
                        .map(|(k, v)| (k, json!(v)))
                        .collect::<IndexMap<String, Value>>(),
                )
            };
            ChartRequest {
                chart_type: kind.to_string(),
                data: Value::Array(data),
                xlabel: None,
                ylabel: None,
                title: None,
                reference_lines,
            }
        })
}

proptest! {
    /// normalize(to_request_shape(normalize(r))) == normalize(r)
    #[test]
    fn normalization_is_idempotent(request in request_strategy()) {
        let first = normalize(&request).expect("generated requests are valid");
        let second = normalize(&to_request_shape(&first)).expect("round trip stays valid");
        prop_assert_eq!(first, second);
    }

    /// Equal-length columns pair labels[i] with values[i], in order.
    #[test]
    fn columns_pair_positionally(
        pairs in prop::collection::vec(("[a-zA-Z0-9]{1,10}", -1e6f64..1e6f64), 1..24)
    ) {
        let labels: Vec<&str> = pairs.iter().map(|(l, _)| l.as_str()).collect();
        let values: Vec<f64> = pairs.iter().map(|(_, v)| *v).collect();
        let request: ChartRequest = serde_json::from_value(json!({
            "type": "bar",
            "data": {"labels": labels, "values": values},
        })).expect("request");

        let spec = normalize(&request).expect("equal lengths are valid");
        prop_assert_eq!(spec.points.len(), pairs.len());
        for (point, (label, value)) in spec.points.iter().zip(&pairs) {
            prop_assert_eq!(&point.x, &Coord::Label(label.clone()));
            prop_assert_eq!(point.y, *value);
        }
    }

    /// Mismatched lengths always fail validation.
    #[test]
    fn mismatched_columns_always_fail(
        labels in prop::collection::vec("[a-z]{1,6}", 0..12),
        values in prop::collection::vec(-1e6f64..1e6f64, 0..12),
    ) {
        prop_assume!(labels.len() != values.len());
        let request: ChartRequest = serde_json::from_value(json!({
            "type": "bar",
            "data": {"labels": labels, "values": values},
        })).expect("request");

        prop_assert!(normalize(&request).is_err());
    }
}
