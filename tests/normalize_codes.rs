use netmig::normalize::{CODE_FIELDS, normalize};
use serde_json::{Map, Value, json};

fn props(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

#[test]
fn every_three_digit_code_is_zero_padded() {
    for c in 0..=999u32 {
        let key = normalize(&props(json!({ "kunta": c }))).unwrap();
        assert_eq!(key.as_str(), format!("KU{:03}", c));
    }
}

#[test]
fn empty_property_bag_has_no_key() {
    assert_eq!(normalize(&Map::new()), None);
}

#[test]
fn each_candidate_field_is_recognised() {
    for field in CODE_FIELDS {
        let mut p = Map::new();
        p.insert(field.to_string(), json!(42));
        assert_eq!(normalize(&p).unwrap().as_str(), "KU042", "field {}", field);
    }
}

#[test]
fn only_the_highest_priority_field_is_used() {
    // `kunta` outranks `id` even when both are present.
    let p = props(json!({ "id": 91, "kunta": 5 }));
    assert_eq!(normalize(&p).unwrap().as_str(), "KU005");

    // null values are skipped, not used.
    let p = props(json!({ "kunta": null, "kuntanumero": null, "kunta_koodi": "78" }));
    assert_eq!(normalize(&p).unwrap().as_str(), "KU078");
}

#[test]
fn codes_of_four_digits_truncate_and_collide() {
    let a = normalize(&props(json!({ "kunta": 1234 }))).unwrap();
    let b = normalize(&props(json!({ "kunta": 234 }))).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "KU234");
}

#[test]
fn string_codes_keep_leading_zeros() {
    let p = props(json!({ "kunta": "091" }));
    assert_eq!(normalize(&p).unwrap().as_str(), "KU091");
}
