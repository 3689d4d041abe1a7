//! Derives the canonical join key (`KU` + three digits) from a feature's property bag.

use crate::models::CanonicalKey;
use serde_json::{Map, Value};

/// Raw code fields, tried in this order. Only the first non-null one is used.
pub const CODE_FIELDS: [&str; 5] = ["kunta", "kuntanumero", "kuntanro", "kunta_koodi", "id"];

const KEY_PREFIX: &str = "KU";
const CODE_WIDTH: usize = 3;

/// Map a property bag to its canonical key, or `None` when no code field is present.
///
/// The selected value is left-padded with `0` to three characters and its last
/// three characters are kept, so `91` becomes `KU091` and `1091` also becomes
/// `KU091`.
pub fn normalize(properties: &Map<String, Value>) -> Option<CanonicalKey> {
    let raw = CODE_FIELDS
        .iter()
        .filter_map(|field| properties.get(*field))
        .find(|v| !v.is_null())?;
    Some(key_from_code(&code_string(raw)))
}

/// Build a key from an already-stringified code.
pub fn key_from_code(code: &str) -> CanonicalKey {
    let padded = format!("{:0>width$}", code, width = CODE_WIDTH);
    let chars: Vec<char> = padded.chars().collect();
    let tail: String = chars[chars.len() - CODE_WIDTH..].iter().collect();
    CanonicalKey::new(format!("{}{}", KEY_PREFIX, tail))
}

/// Decimal string form of a raw code value. Integral floats drop their
/// fractional part (`91.0` -> `"91"`).
fn code_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn pads_short_codes() {
        assert_eq!(normalize(&props(json!({"kunta": 5}))).unwrap().as_str(), "KU005");
        assert_eq!(normalize(&props(json!({"kunta": "91"}))).unwrap().as_str(), "KU091");
        assert_eq!(normalize(&props(json!({"kunta": 91.0}))).unwrap().as_str(), "KU091");
    }

    #[test]
    fn priority_order_wins_over_later_fields() {
        let p = props(json!({"id": 1, "kuntanro": 49, "kunta": null}));
        assert_eq!(normalize(&p).unwrap().as_str(), "KU049");
    }

    #[test]
    fn long_codes_keep_last_three_digits() {
        assert_eq!(normalize(&props(json!({"kunta": 1234}))).unwrap().as_str(), "KU234");
        assert_eq!(key_from_code("234"), key_from_code("1234"));
    }

    #[test]
    fn non_numeric_codes_still_produce_a_key() {
        assert_eq!(normalize(&props(json!({"id": "abcd"}))).unwrap().as_str(), "KUbcd");
    }

    #[test]
    fn missing_code_fields_give_none() {
        assert_eq!(normalize(&Map::new()), None);
        assert_eq!(normalize(&props(json!({"namefin": "Espoo", "kunta": null}))), None);
    }
}
