use netmig::interaction::{InteractionStates, style_from_base};
use netmig::join::join;
use netmig::models::{RegionFeature, StatisticsIndex, StatisticsRecord};
use netmig::{VisualState, detail_for, style_for};
use serde_json::{Value, json};

fn region(props: Value, record: Option<StatisticsRecord>) -> netmig::JoinedRegion {
    let index: StatisticsIndex = record
        .map(|r| ("KU091".into(), r))
        .into_iter()
        .collect();
    join(RegionFeature::new(props.as_object().cloned().unwrap(), None), &index)
}

#[test]
fn hover_round_trip_restores_default_style() {
    let r = region(json!({"kunta": 91, "namefin": "Helsinki"}), Some(StatisticsRecord::new(8, 10)));
    let before = style_for(&r, VisualState::Default);
    let hovered = style_for(&r, VisualState::Hovered);
    let after = style_for(&r, VisualState::Default);

    assert_eq!(before, after);
    assert_eq!(hovered.fill_color, before.fill_color);
    assert_eq!(hovered.stroke_color, before.stroke_color);
    assert_eq!(before.fill_color, before.stroke_color);
    assert_eq!((before.stroke_width, before.fill_opacity), (2, 0.45));
    assert_eq!((hovered.stroke_width, hovered.fill_opacity), (3, 0.6));
}

#[test]
fn state_machine_drives_styles_without_touching_color() {
    let regions = vec![
        region(json!({"kunta": 91}), Some(StatisticsRecord::new(30, 10))),
        region(json!({"kunta": 91}), Some(StatisticsRecord::new(1, 10))),
    ];
    let mut states = InteractionStates::new(regions.len());
    let base: Vec<_> = regions.iter().map(|r| style_for(r, VisualState::Default)).collect();

    states.pointer_enter(0);
    let s0 = style_for(&regions[0], states.state(0));
    let s1 = style_for(&regions[1], states.state(1));
    assert_eq!(s0.stroke_width, 3);
    assert_eq!(s1, base[1]);

    states.pointer_leave(0);
    assert_eq!(style_for(&regions[0], states.state(0)), base[0]);
}

#[test]
fn style_from_base_matches_region_style() {
    let r = region(json!({"kunta": 91}), Some(StatisticsRecord::new(5, 5)));
    assert_eq!(
        style_from_base(r.base_color, VisualState::Hovered),
        style_for(&r, VisualState::Hovered)
    );
}

#[test]
fn detail_shows_signed_net() {
    let gain = region(json!({"kunta": 91, "namefin": "Helsinki"}), Some(StatisticsRecord::new(12, 4)));
    let d = detail_for(&gain);
    assert_eq!(d.label.as_deref(), Some("Helsinki"));
    assert_eq!(d.body, "Helsinki\nInflow: 12\nOutflow: 4\nNet migration: +8");

    let loss = region(json!({"kunta": 91, "name": "Helsinki"}), Some(StatisticsRecord::new(4, 12)));
    assert!(detail_for(&loss).body.ends_with("Net migration: -8"));

    let even = region(json!({"kunta": 91, "namefin": "Helsinki"}), Some(StatisticsRecord::new(3, 3)));
    assert!(detail_for(&even).body.ends_with("Net migration: +0"));
}

#[test]
fn missing_record_never_shows_placeholder_figures() {
    let r = region(json!({"kunta": 91, "namefin": "Helsinki"}), None);
    let d = detail_for(&r);
    assert_eq!(d.body, "Helsinki");
    assert!(!d.body.contains("Inflow"));
}

#[test]
fn unnamed_region_has_no_label() {
    let r = region(json!({"kunta": 91}), None);
    let d = detail_for(&r);
    assert!(d.label.is_none());
    assert_eq!(d.body, netmig::interaction::UNNAMED);
}
