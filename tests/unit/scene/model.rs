use super::*;

fn tri(x: f64, y: f64) -> Drawable {
    Drawable::new(vec![
        Point::new(x, y),
        Point::new(x + 1.0, y),
        Point::new(x, y + 1.0),
    ])
}

fn nested_parts() -> Model {
    // part 0 <- part 1 <- part 2, part 3 standalone
    Model {
        drawables: vec![
            tri(0.0, 0.0).with_parent_part(2),
            tri(0.0, 0.0).with_parent_part(1),
            tri(0.0, 0.0).with_parent_part(3),
            tri(0.0, 0.0),
        ],
        parts: vec![
            Part { parent: None },
            Part { parent: Some(0) },
            Part { parent: Some(1) },
            Part { parent: None },
        ],
        offscreens: vec![Offscreen {
            owner_part: 1,
            masks: vec![3],
            render_order: 0,
        }],
        ..Model::default()
    }
}

#[test]
fn parses_points_in_array_and_object_form() {
    let m = Model::from_json_str(
        r#"{
            "drawables": [
                { "vertices": [[0, 0], {"x": 2, "y": 3}] },
                { "masks": [0], "vertices": [[1, 1]] }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(m.drawables[0].vertices[1], Point::new(2.0, 3.0));
    assert_eq!(m.drawables[1].masks, vec![0]);
    assert!(m.drawables[1].is_visible);
    assert!(m.drawables[1].vertex_positions_changed);
    assert_eq!(m.pixels_per_unit, 1.0);
}

#[test]
fn rejects_unknown_mask_index() {
    let err = Model::from_json_str(r#"{ "drawables": [ { "masks": [4] } ] }"#).unwrap_err();
    assert!(matches!(err, MaskpackError::Validation(_)));
}

#[test]
fn rejects_malformed_json_as_serde_error() {
    let err = Model::from_json_str("{ nope").unwrap_err();
    assert!(matches!(err, MaskpackError::Serde(_)));
}

#[test]
fn rejects_part_cycles() {
    let m = Model {
        parts: vec![Part { parent: Some(1) }, Part { parent: Some(0) }],
        ..Model::default()
    };
    assert!(m.validate().is_err());
}

#[test]
fn ancestors_walk_nearest_first() {
    let m = nested_parts();
    assert_eq!(m.ancestors(2).collect::<Vec<_>>(), vec![1, 0]);
    assert!(m.is_part_within(2, 0));
    assert!(m.is_part_within(1, 1));
    assert!(!m.is_part_within(3, 0));
}

#[test]
fn drawables_under_part_recurse_into_child_parts() {
    let m = nested_parts();
    assert_eq!(m.drawables_under_part(1), vec![0, 1]);
    assert_eq!(m.drawables_under_part(0), vec![0, 1]);
    assert_eq!(m.drawables_under_part(3), vec![2]);
}

#[test]
fn covered_drawables_by_kind() {
    let m = nested_parts();
    assert_eq!(m.covered_drawables(ObjectKind::Drawable, 2), vec![2]);
    assert!(m.covered_drawables(ObjectKind::Drawable, 99).is_empty());
    assert_eq!(m.covered_drawables(ObjectKind::Offscreen, 0), vec![0, 1]);
    assert_eq!(m.masks_of(ObjectKind::Offscreen, 0), &[3]);
    assert!(m.is_using_masking(ObjectKind::Offscreen));
    assert!(!m.is_using_masking(ObjectKind::Drawable));
    assert_eq!(m.offscreen_owned_by(1), Some(0));
    assert_eq!(m.offscreen_owned_by(0), None);
}
