//! Post-hoc numeric normalization of result rows.
//!
//! The backend returns numeric cells as strings; the query annotation says
//! which columns are semantically numeric. Casting is purely additive: it
//! only touches columns present in both a row and the annotation, and a cell
//! that refuses to coerce is left exactly as it arrived.

use serde_json::Value;

use crate::types::CubeResponse;

/// Coerces stringly-typed numeric cells to numbers, in place.
///
/// No-op unless both `data` and `annotation` are present. Whole-valued
/// results are narrowed to integers (`"123.0"` becomes `123`).
pub fn cast_numerics(response: &mut CubeResponse) {
    let Some(annotation) = response.annotation.as_ref() else {
        return;
    };
    let numeric_columns: Vec<String> = annotation
        .dimensions
        .iter()
        .chain(annotation.measures.iter())
        .filter(|(_, meta)| meta.column_type.as_deref() == Some("number"))
        .map(|(name, _)| name.clone())
        .collect();

    let Some(rows) = response.data.as_mut() else {
        return;
    };
    for row in rows {
        for column in &numeric_columns {
            let Some(cell) = row.get(column) else {
                continue;
            };
            let Some(parsed) = coerce_f64(cell) else {
                continue;
            };
            row.insert(column.clone(), narrow(parsed));
        }
    }
}

/// Strings like `"NaN"` and `"inf"` parse as f64 but have no JSON number
/// representation, so they count as coercion failures.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Integer when the value is whole and representable, float otherwise.
fn narrow(value: f64) -> Value {
    const MAX_EXACT: f64 = i64::MAX as f64;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
