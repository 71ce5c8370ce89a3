//! Integration tests: pointer gestures driving scene transforms.
//!
//! Each test feeds a full down → move… → up sequence through a
//! `TransformTool` and checks the resulting scene against transforms
//! applied directly.

use pretty_assertions::assert_eq;
use vf_core::kurbo::{Affine, Point, Rect};
use vf_core::{
    AnchorPoint, DiagnosticKind, Rectangle, Scene, ShapeKey, ShapeKind, TransformReport, approx_eq,
    rotate_around,
};
use vf_editor::{InputEvent, Modifiers, Tool, ToolKind, TransformTool};

// ─── Helpers ─────────────────────────────────────────────────────────────

fn square(scene: &mut Scene, x: f64, y: f64) -> ShapeKey {
    scene.add(ShapeKind::Rectangle(Rectangle::new(Rect::new(x, y, x + 10.0, y + 10.0))))
}

/// Press at the first point, move through the middle ones, release at the last.
fn drag(
    tool: &mut TransformTool,
    scene: &mut Scene,
    selection: &[ShapeKey],
    path: &[(f32, f32)],
    modifiers: Modifiers,
) -> TransformReport {
    let mut report = TransformReport::default();
    let (first, rest) = path.split_first().expect("drag needs a start point");
    report.merge(tool.handle(
        scene,
        &InputEvent::from_pointer_down(first.0, first.1, 1.0).with_modifiers(modifiers),
        selection,
    ));
    if let Some((last, middle)) = rest.split_last() {
        for (x, y) in middle {
            report.merge(tool.handle(
                scene,
                &InputEvent::from_pointer_move(*x, *y, 1.0).with_modifiers(modifiers),
                selection,
            ));
        }
        report.merge(tool.handle(
            scene,
            &InputEvent::from_pointer_up(last.0, last.1).with_modifiers(modifiers),
            selection,
        ));
    }
    report
}

/// Points on a quarter circle of radius 10 around (15, 5), from +x to +y.
fn quarter_turn() -> Vec<(f32, f32)> {
    let mut path: Vec<(f32, f32)> = (0..9)
        .map(|i| {
            let t = f64::from(i) * std::f64::consts::FRAC_PI_2 / 9.0;
            ((15.0 + 10.0 * t.cos()) as f32, (5.0 + 10.0 * t.sin()) as f32)
        })
        .collect();
    path.push((15.0, 15.0));
    path
}

fn assert_rect_close(a: Rect, b: Rect) {
    let d = (a.x0 - b.x0).abs() + (a.y0 - b.y0).abs() + (a.x1 - b.x1).abs() + (a.y1 - b.y1).abs();
    assert!(d < 1e-6, "{a:?} != {b:?}");
}

// ─── Move ────────────────────────────────────────────────────────────────

#[test]
fn move_drag_translates_by_total() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let mut tool = TransformTool::new(ToolKind::Move);
    let report = drag(
        &mut tool,
        &mut scene,
        &[a],
        &[(5.0, 5.0), (8.0, 6.0), (12.0, 9.0), (25.0, 15.0)],
        Modifiers::NONE,
    );
    assert!(report.is_clean());
    assert!(!tool.is_active());
    assert_rect_close(scene.scene_bounds(a).unwrap(), Rect::new(20.0, 10.0, 30.0, 20.0));
}

#[test]
fn shift_move_locks_to_dominant_axis() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let mut tool = TransformTool::new(ToolKind::Move);
    drag(&mut tool, &mut scene, &[a], &[(0.0, 0.0), (3.0, 8.0)], Modifiers::SHIFT);
    assert_rect_close(scene.scene_bounds(a).unwrap(), Rect::new(0.0, 8.0, 10.0, 18.0));
}

#[test]
fn consecutive_group_drags_accumulate() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let b = square(&mut scene, 20.0, 0.0);
    let g = scene.group(&[a, b]).unwrap();
    let mut tool = TransformTool::new(ToolKind::Move);

    drag(&mut tool, &mut scene, &[g], &[(0.0, 0.0), (4.0, 0.0), (10.0, 0.0)], Modifiers::NONE);
    drag(&mut tool, &mut scene, &[g], &[(0.0, 0.0), (0.0, 3.0), (0.0, 5.0)], Modifiers::NONE);

    assert_rect_close(scene.scene_bounds(a).unwrap(), Rect::new(10.0, 5.0, 20.0, 15.0));
    assert_rect_close(scene.scene_bounds(b).unwrap(), Rect::new(30.0, 5.0, 40.0, 15.0));
}

#[test]
fn selecting_a_member_moves_its_group() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let b = square(&mut scene, 20.0, 0.0);
    scene.group(&[a, b]).unwrap();
    let mut tool = TransformTool::new(ToolKind::Move);
    let report = drag(&mut tool, &mut scene, &[a], &[(0.0, 0.0), (0.0, 7.0)], Modifiers::NONE);
    assert_eq!(report.count(DiagnosticKind::MembershipLocked), 0);
    assert_rect_close(scene.scene_bounds(b).unwrap(), Rect::new(20.0, 7.0, 30.0, 17.0));
}

// ─── Rotate ──────────────────────────────────────────────────────────────

#[test]
fn rotate_drag_on_group_matches_direct_rotation() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let b = square(&mut scene, 20.0, 0.0);
    let g = scene.group(&[a, b]).unwrap();

    let mut direct = Scene::new();
    let da = square(&mut direct, 0.0, 0.0);
    let db = square(&mut direct, 20.0, 0.0);
    let anchor = Point::new(15.0, 5.0);
    direct.apply_transform(da, rotate_around(90.0, Point::ZERO), Some(anchor));
    direct.apply_transform(db, rotate_around(90.0, Point::ZERO), Some(anchor));

    let mut tool = TransformTool::new(ToolKind::Rotate);
    let report = drag(&mut tool, &mut scene, &[g], &quarter_turn(), Modifiers::NONE);
    assert!(report.is_clean());

    assert_rect_close(scene.scene_bounds(a).unwrap(), direct.scene_bounds(da).unwrap());
    assert_rect_close(scene.scene_bounds(b).unwrap(), direct.scene_bounds(db).unwrap());
}

#[test]
fn mixed_selection_rotates_leaves_and_groups_alike() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let b = square(&mut scene, 20.0, 0.0);
    let loose = square(&mut scene, 10.0, 0.0);
    let g = scene.group(&[a, b]).unwrap();
    let before: Vec<Affine> = [a, b, loose]
        .iter()
        .map(|k| scene.world_transform(*k).unwrap())
        .collect();

    let mut tool = TransformTool::new(ToolKind::Rotate);
    tool.anchor = AnchorPoint::Custom(Point::new(15.0, 5.0));
    drag(&mut tool, &mut scene, &[g, loose], &quarter_turn(), Modifiers::NONE);

    let expected = rotate_around(90.0, Point::new(15.0, 5.0));
    for (key, w0) in [a, b, loose].iter().zip(before) {
        assert!(approx_eq(scene.world_transform(*key).unwrap(), expected * w0, 1e-6));
    }
}

// ─── Scale / Shear ───────────────────────────────────────────────────────

#[test]
fn scale_through_the_anchor_stays_invertible() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let mut tool = TransformTool::new(ToolKind::Scale);
    tool.anchor = AnchorPoint::TopLeft;
    let report = drag(
        &mut tool,
        &mut scene,
        &[a],
        &[(10.0, 10.0), (5.0, 5.0), (0.0, 0.0), (-10.0, -10.0)],
        Modifiers::NONE,
    );
    assert!(report.is_clean());
    let world = scene.world_transform(a).unwrap();
    assert!(world.determinant() > 0.0);
    assert_rect_close(scene.scene_bounds(a).unwrap(), Rect::new(0.0, 0.0, 0.1, 0.1));
}

#[test]
fn shear_drag_carries_the_grabbed_corner() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let mut tool = TransformTool::new(ToolKind::Shear);
    tool.anchor = AnchorPoint::TopLeft;
    drag(&mut tool, &mut scene, &[a], &[(10.0, 10.0), (12.0, 10.0), (15.0, 10.0)], Modifiers::NONE);
    let world = scene.world_transform(a).unwrap();
    assert!((world * Point::new(10.0, 10.0) - Point::new(15.0, 10.0)).hypot() < 1e-9);
    assert_rect_close(scene.scene_bounds(a).unwrap(), Rect::new(0.0, 0.0, 15.0, 10.0));
}

// ─── Cancel / diagnostics ────────────────────────────────────────────────

#[test]
fn escape_restores_the_pre_drag_state() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let b = square(&mut scene, 20.0, 0.0);
    let loose = square(&mut scene, 40.0, 40.0);
    let g = scene.group(&[a, b]).unwrap();
    let before: Vec<Affine> = [a, b, loose]
        .iter()
        .map(|k| scene.world_transform(*k).unwrap())
        .collect();

    let mut tool = TransformTool::new(ToolKind::Rotate);
    let selection = [g, loose];
    tool.handle(&mut scene, &InputEvent::from_pointer_down(60.0, 20.0, 1.0), &selection);
    tool.handle(&mut scene, &InputEvent::from_pointer_move(40.0, 60.0, 1.0), &selection);
    let escape = InputEvent::Key {
        key: "Escape".into(),
        modifiers: Modifiers::NONE,
    };
    assert!(tool.handle(&mut scene, &escape, &selection).is_clean());
    assert!(!tool.is_active());

    for (key, w0) in [a, b, loose].iter().zip(before) {
        assert!(approx_eq(scene.world_transform(*key).unwrap(), w0, 1e-9));
    }
}

#[test]
fn stale_member_is_reported_while_live_members_move() {
    let mut scene = Scene::new();
    let a = square(&mut scene, 0.0, 0.0);
    let b = square(&mut scene, 20.0, 0.0);
    let g = scene.group(&[a, b]).unwrap();
    scene.destroy(a);

    let mut tool = TransformTool::new(ToolKind::Move);
    let report = drag(&mut tool, &mut scene, &[g], &[(0.0, 0.0), (5.0, 0.0)], Modifiers::NONE);
    assert!(report.count(DiagnosticKind::StaleGroupMember) > 0);
    assert!(report.diagnostics.iter().all(|d| d.shape == a));
    assert_rect_close(scene.scene_bounds(b).unwrap(), Rect::new(25.0, 0.0, 35.0, 10.0));
}
