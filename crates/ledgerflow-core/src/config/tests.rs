use super::*;
use serde_json::json;

#[test]
fn width_below_minimum_is_rejected_and_leaves_store_untouched() {
    let mut store = ConfigStore::default();
    let before = store.get("width");

    let err = store.set("width", json!(100)).unwrap_err();
    assert!(matches!(err, Error::Validation { ref path, .. } if path == "width"));
    assert_eq!(store.get("width"), before);

    store.set("width", json!(1000)).unwrap();
    assert_eq!(store.get("width"), Some(json!(1000)));
}

#[test]
fn wrong_type_is_rejected() {
    let mut store = ConfigStore::default();
    assert!(store.set("autoCenter", json!("yes")).is_err());
    assert!(store.set("curveIntensity", json!("0.4")).is_err());
    assert!(store.set("colors.revenue", json!("not a color!")).is_err());
    assert!(store.set("colors.revenue", json!("#ff8800")).is_ok());
}

#[test]
fn paths_below_scalar_values_are_rejected() {
    let mut store = ConfigStore::default();
    let before = store.get_all();

    let err = store.set("width.x", json!(1)).unwrap_err();
    assert!(matches!(err, Error::Validation { ref path, .. } if path == "width.x"));
    assert!(store.set("margin.left.inner", json!(1)).is_err());
    assert!(store.set("title.text", json!("Acme")).is_err());
    assert_eq!(store.get_all(), before);
    assert_eq!(store.get_f64("width"), Some(1200.0));

    // Free-form keys may still nest under objects.
    store.set("extra.note", json!("kept")).unwrap();
    assert!(store.set("extra.note.deeper", json!(1)).is_err());
    assert_eq!(store.get_str("extra.note"), Some("kept"));
}

#[test]
fn setting_a_partial_object_keeps_sibling_keys() {
    let mut store = ConfigStore::new(ChartKind::Bar);
    store.set("margin", json!({ "top": 10 })).unwrap();

    assert_eq!(store.get_f64("margin.top"), Some(10.0));
    assert_eq!(store.get_f64("margin.left"), Some(80.0));
    assert_eq!(store.get_f64("margin.right"), Some(40.0));
    let margin = store.layout_settings().margin;
    assert_eq!((margin.top, margin.right, margin.left), (10.0, 40.0, 80.0));
}

#[test]
fn update_is_all_or_nothing() {
    let mut store = ConfigStore::default();
    let before = store.get_all();

    let err = store
        .update(&json!({
            "height": 900,
            "curveIntensity": 0.95,
        }))
        .unwrap_err();
    assert!(matches!(err, Error::Validation { ref path, .. } if path == "curveIntensity"));
    assert_eq!(store.get_all(), before);

    store
        .update(&json!({ "height": 900, "margin": { "left": 40 } }))
        .unwrap();
    assert_eq!(store.get_f64("height"), Some(900.0));
    assert_eq!(store.get_f64("margin.left"), Some(40.0));
    // Deep merge keeps sibling keys.
    assert_eq!(store.get_f64("margin.right"), Some(160.0));
}

#[test]
fn nested_curvature_values_are_validated() {
    let mut store = ConfigStore::default();
    assert!(
        store
            .update(&json!({ "curvature": { "layerCurvature": { "1": 0.9 } } }))
            .is_err()
    );
    assert!(
        store
            .set("curvature.layerCurvature", json!({ "0": 0.05 }))
            .is_err()
    );
    store.set("curvature.layerCurvature.3", json!(0.5)).unwrap();
    assert_eq!(store.layer_curvature().get(&3), Some(&0.5));
}

#[test]
fn dramatic_preset_replaces_only_the_curvature_map() {
    let mut store = ConfigStore::default();
    store.set("curvature.layerCurvature.5", json!(0.3)).unwrap();
    store.set("nodePadding", json!(12)).unwrap();

    store.apply_preset("dramatic").unwrap();
    assert_eq!(
        store.get("curvature.layerCurvature"),
        Some(json!({ "0": 0.4, "1": 0.6, "2": 0.7 }))
    );
    assert_eq!(store.get_f64("nodePadding"), Some(12.0));
}

#[test]
fn unknown_preset_is_not_found() {
    let mut store = ConfigStore::default();
    let before = store.get_all();
    let err = store.apply_preset("wobbly").unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    assert_eq!(store.get_all(), before);
}

#[test]
fn registered_presets_are_validated() {
    let mut store = ConfigStore::default();
    assert!(
        store
            .register_preset("flat", CurvaturePreset::from([(0, 0.01)]))
            .is_err()
    );
    store
        .register_preset("flat", CurvaturePreset::from([(0, 0.1), (1, 0.1)]))
        .unwrap();
    store.apply_preset("flat").unwrap();
    assert_eq!(store.curvature_settings().for_layer(1), 0.1);
    assert_eq!(store.curvature_settings().for_layer(7), 0.4);
}

#[test]
fn returned_values_do_not_alias_internal_state() {
    let store = ConfigStore::default();
    let mut all = store.get_all();
    all["width"] = json!(4000);
    assert_eq!(store.get_f64("width"), Some(1200.0));
}

#[test]
fn get_all_round_trips_through_update() {
    let mut a = ConfigStore::default();
    a.set("linkOpacity", json!(0.3)).unwrap();
    a.apply_preset("gentle").unwrap();

    let mut b = ConfigStore::default();
    b.update(&a.get_all()).unwrap();
    assert_eq!(a.get_all(), b.get_all());
}

#[test]
fn changed_paths_report_only_differing_leaves() {
    let store = ConfigStore::default();
    let changed = store.changed_paths(&json!({
        "width": 1200,
        "curveIntensity": 0.5,
        "margin": { "top": 60, "left": 10 },
    }));
    assert_eq!(changed, vec!["curveIntensity".to_string(), "margin.left".to_string()]);
}

#[test]
fn chart_type_defaults_layer_under_overrides() {
    let store = ConfigStore::with_overrides(ChartKind::Bar, &json!({ "width": 800 })).unwrap();
    assert_eq!(store.get_str("chartType"), Some("bar"));
    assert_eq!(store.get_f64("margin.left"), Some(80.0));
    assert_eq!(store.get_f64("width"), Some(800.0));
    assert_eq!(store.layout_settings().bar_padding, 0.2);

    assert!(ConfigStore::with_overrides(ChartKind::Sankey, &json!({ "width": 10 })).is_err());
}

#[test]
fn reset_restores_layered_defaults() {
    let mut store = ConfigStore::new(ChartKind::Bar);
    store.set("width", json!(2000)).unwrap();
    store.reset();
    assert_eq!(store.get_f64("width"), Some(1200.0));
    assert_eq!(store.get_f64("margin.bottom"), Some(120.0));
}
