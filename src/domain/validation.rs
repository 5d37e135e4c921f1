//! Structural validation of generation requests.
//!
//! Validation walks the raw JSON so that every violation is reported at once,
//! then hands the accepted body to serde. Nothing here touches the filesystem.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

pub use layoutgen_api_types::Violation;

use super::layout::{BASE_CATEGORY, LayoutDocument, TEXT_CATEGORY};

/// Longest accepted document index; it becomes a filename stem.
pub const MAX_INDEX_LEN: usize = 128;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("request body violates the layout schema ({} violation(s))", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation {
                path: path.into(),
                message: message.into(),
            }],
        }
    }
}

#[derive(Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a request body and decode it into layout documents.
pub fn validate(body: &Value) -> Result<Vec<LayoutDocument>, ValidationError> {
    let Some(items) = body.as_array() else {
        return Err(ValidationError::single(
            "",
            "expected an array of layout documents",
        ));
    };

    let mut violations = Violations::default();
    if items.is_empty() {
        violations.push("", "expected at least one layout document");
    }

    let mut seen_indexes = HashSet::new();
    for (position, item) in items.iter().enumerate() {
        check_document(item, &format!("/{position}"), &mut seen_indexes, &mut violations);
    }

    if !violations.0.is_empty() {
        return Err(ValidationError {
            violations: violations.0,
        });
    }

    serde_json::from_value(body.clone()).map_err(|err| ValidationError::single("", err.to_string()))
}

/// Whether `index` can be used verbatim as an output filename stem.
pub fn is_safe_index(index: &str) -> bool {
    !index.is_empty()
        && index.len() <= MAX_INDEX_LEN
        && !index.starts_with('.')
        && index
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn check_document(
    item: &Value,
    path: &str,
    seen_indexes: &mut HashSet<String>,
    violations: &mut Violations,
) {
    let Some(doc) = item.as_object() else {
        violations.push(path, "expected a layout document object");
        return;
    };

    if let Some(index) = required_string(doc, path, "index", violations) {
        if !is_safe_index(index) {
            violations.push(
                format!("{path}/index"),
                format!(
                    "expected 1-{MAX_INDEX_LEN} characters of [A-Za-z0-9_.-] not starting with `.`"
                ),
            );
        } else if !seen_indexes.insert(index.to_string()) {
            violations.push(
                format!("{path}/index"),
                format!("duplicate index `{index}` within batch"),
            );
        }
    }

    required_string(doc, path, "full_image_caption", violations);

    let layers_path = format!("{path}/layers_all");
    match doc.get("layers_all") {
        None => violations.push(layers_path, "missing required array"),
        Some(Value::Array(layers)) if layers.is_empty() => {
            violations.push(layers_path, "expected at least one layer");
        }
        Some(Value::Array(layers)) => {
            let mut base_layers = 0usize;
            for (position, layer) in layers.iter().enumerate() {
                if check_layer(layer, &format!("{layers_path}/{position}"), violations) {
                    base_layers += 1;
                }
            }
            if base_layers > 1 {
                violations.push(
                    layers_path,
                    format!("expected exactly one `{BASE_CATEGORY}` layer, found {base_layers}"),
                );
            }
        }
        Some(_) => violations.push(layers_path, "expected an array of layers"),
    }
}

/// Returns whether the layer is a base layer.
fn check_layer(item: &Value, path: &str, violations: &mut Violations) -> bool {
    let Some(layer) = item.as_object() else {
        violations.push(path, "expected a layer object");
        return false;
    };

    let category = required_string(layer, path, "category", violations);
    let top_left = required_point(layer, path, "top_left", violations);
    let bottom_right = required_point(layer, path, "bottom_right", violations);
    required_string(layer, path, "caption", violations);

    if let (Some(top_left), Some(bottom_right)) = (top_left, bottom_right) {
        if bottom_right[0] < top_left[0] || bottom_right[1] < top_left[1] {
            violations.push(
                format!("{path}/bottom_right"),
                format!(
                    "expected a point at or below-right of top_left [{}, {}]",
                    top_left[0], top_left[1]
                ),
            );
        }
    }

    match (category, layer.get("text")) {
        (Some(TEXT_CATEGORY), None) => violations.push(
            format!("{path}/text"),
            format!("missing required string for `{TEXT_CATEGORY}` layers"),
        ),
        (_, Some(value)) if !value.is_string() => {
            violations.push(format!("{path}/text"), "expected a string");
        }
        _ => {}
    }

    if let Some(active) = layer.get("active") {
        if !active.is_boolean() {
            violations.push(format!("{path}/active"), "expected a boolean");
        }
    }

    category == Some(BASE_CATEGORY)
}

fn required_string<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    field: &str,
    violations: &mut Violations,
) -> Option<&'a str> {
    match object.get(field) {
        Some(Value::String(value)) => Some(value.as_str()),
        Some(_) => {
            violations.push(format!("{path}/{field}"), "expected a string");
            None
        }
        None => {
            violations.push(format!("{path}/{field}"), "missing required string");
            None
        }
    }
}

fn required_point(
    object: &Map<String, Value>,
    path: &str,
    field: &str,
    violations: &mut Violations,
) -> Option<[i64; 2]> {
    let field_path = format!("{path}/{field}");
    let Some(value) = object.get(field) else {
        violations.push(field_path, "missing required point [x, y]");
        return None;
    };

    let point = value.as_array().and_then(|coords| match coords.as_slice() {
        [x, y] => Some([x.as_i64()?, y.as_i64()?]),
        _ => None,
    });

    match point {
        Some(point) if point[0] >= 0 && point[1] >= 0 => Some(point),
        _ => {
            violations.push(field_path, "expected a pair of non-negative integers [x, y]");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid_body() -> Value {
        json!([{
            "index": "3_2",
            "full_image_caption": "A product launch slide",
            "layers_all": [
                {
                    "category": "base",
                    "top_left": [0, 0],
                    "bottom_right": [1536, 864],
                    "caption": "gradient background"
                },
                {
                    "category": "text",
                    "top_left": [100, 80],
                    "bottom_right": [1400, 200],
                    "caption": "title",
                    "text": "Launch day",
                    "active": true
                },
                {
                    "category": "image",
                    "top_left": [200, 300],
                    "bottom_right": [600, 700],
                    "caption": "a rocket"
                }
            ]
        }])
    }

    fn paths(err: &ValidationError) -> Vec<&str> {
        err.violations.iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn accepts_a_well_formed_batch() {
        let docs = validate(&valid_body()).expect("valid body");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].index, "3_2");
        assert_eq!(docs[0].layers_all.len(), 3);
        assert_eq!(docs[0].layers_all[1].text.as_deref(), Some("Launch day"));
    }

    #[test]
    fn preserves_unknown_fields() {
        let mut body = valid_body();
        body[0]["style"] = json!("minimal");
        body[0]["layers_all"][2]["asset"] = json!("rocket.png");

        let docs = validate(&body).expect("valid body");
        assert_eq!(docs[0].extra.get("style"), Some(&json!("minimal")));
        assert_eq!(
            docs[0].layers_all[2].extra.get("asset"),
            Some(&json!("rocket.png"))
        );
    }

    #[test]
    fn rejects_non_array_bodies() {
        let err = validate(&json!({"index": "1"})).expect_err("object body");
        assert_eq!(paths(&err), vec![""]);
    }

    #[test]
    fn rejects_an_empty_batch() {
        let err = validate(&json!([])).expect_err("empty batch");
        assert_eq!(paths(&err), vec![""]);
    }

    #[test]
    fn names_each_missing_field() {
        for field in ["index", "full_image_caption", "layers_all"] {
            let mut body = valid_body();
            body[0].as_object_mut().expect("object").remove(field);
            let err = validate(&body).expect_err("missing field");
            assert!(
                err.violations
                    .iter()
                    .any(|v| v.path == format!("/0/{field}")),
                "no violation for {field}: {err:?}"
            );
        }
    }

    #[test]
    fn reports_every_violation_not_just_the_first() {
        let body = json!([{
            "index": 7,
            "full_image_caption": null,
            "layers_all": [
                { "category": "text", "top_left": [0, 0], "bottom_right": [10], "caption": 3 },
                "not a layer"
            ]
        }]);

        let err = validate(&body).expect_err("invalid body");
        let paths = paths(&err);
        for expected in [
            "/0/index",
            "/0/full_image_caption",
            "/0/layers_all/0/bottom_right",
            "/0/layers_all/0/caption",
            "/0/layers_all/0/text",
            "/0/layers_all/1",
        ] {
            assert!(paths.contains(&expected), "missing {expected} in {paths:?}");
        }
    }

    #[test]
    fn text_is_required_only_for_text_layers() {
        let mut body = valid_body();
        body[0]["layers_all"][1]
            .as_object_mut()
            .expect("object")
            .remove("text");
        let err = validate(&body).expect_err("text layer without text");
        assert_eq!(paths(&err), vec!["/0/layers_all/1/text"]);

        let mut body = valid_body();
        body[0]["layers_all"][2]["text"] = json!(12);
        let err = validate(&body).expect_err("non-string text");
        assert_eq!(paths(&err), vec!["/0/layers_all/2/text"]);
    }

    #[test]
    fn rejects_wrong_primitive_types_in_geometry() {
        let mut body = valid_body();
        body[0]["layers_all"][0]["top_left"] = json!(["0", 0]);
        body[0]["layers_all"][0]["bottom_right"] = json!([1536.5, 864]);
        body[0]["layers_all"][1]["active"] = json!("yes");

        let err = validate(&body).expect_err("bad geometry");
        assert_eq!(
            paths(&err),
            vec![
                "/0/layers_all/0/top_left",
                "/0/layers_all/0/bottom_right",
                "/0/layers_all/1/active",
            ]
        );
    }

    #[test]
    fn rejects_inverted_and_negative_rectangles() {
        let mut body = valid_body();
        body[0]["layers_all"][2]["top_left"] = json!([600, 700]);
        body[0]["layers_all"][2]["bottom_right"] = json!([200, 300]);
        let err = validate(&body).expect_err("inverted rectangle");
        assert_eq!(paths(&err), vec!["/0/layers_all/2/bottom_right"]);

        let mut body = valid_body();
        body[0]["layers_all"][2]["top_left"] = json!([-5, 0]);
        let err = validate(&body).expect_err("negative coordinate");
        assert_eq!(paths(&err), vec!["/0/layers_all/2/top_left"]);
    }

    #[test]
    fn rejects_empty_layer_lists() {
        let mut body = valid_body();
        body[0]["layers_all"] = json!([]);
        let err = validate(&body).expect_err("no layers");
        assert_eq!(paths(&err), vec!["/0/layers_all"]);
    }

    #[test]
    fn rejects_more_than_one_base_layer() {
        let mut body = valid_body();
        let base = body[0]["layers_all"][0].clone();
        body[0]["layers_all"]
            .as_array_mut()
            .expect("array")
            .push(base);
        let err = validate(&body).expect_err("two base layers");
        assert_eq!(paths(&err), vec!["/0/layers_all"]);
    }

    #[test]
    fn missing_base_layer_is_left_to_classification() {
        let mut body = valid_body();
        body[0]["layers_all"]
            .as_array_mut()
            .expect("array")
            .remove(0);
        assert!(validate(&body).is_ok());
    }

    #[test]
    fn rejects_unsafe_and_duplicate_indexes() {
        for unsafe_index in ["", "../etc", "a/b", ".hidden", "with space"] {
            let mut body = valid_body();
            body[0]["index"] = json!(unsafe_index);
            let err = validate(&body).expect_err("unsafe index");
            assert_eq!(paths(&err), vec!["/0/index"], "index {unsafe_index:?}");
        }

        let mut body = valid_body();
        let copy = body[0].clone();
        body.as_array_mut().expect("array").push(copy);
        let err = validate(&body).expect_err("duplicate index");
        assert_eq!(paths(&err), vec!["/1/index"]);
    }

    #[test]
    fn safe_index_accepts_catalog_style_keys() {
        for index in ["3_2", "1042", "deck-7.v2", "My_Slide"] {
            assert!(is_safe_index(index), "{index}");
        }
        assert!(!is_safe_index(&"x".repeat(MAX_INDEX_LEN + 1)));
    }
}
