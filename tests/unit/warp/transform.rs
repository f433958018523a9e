use super::*;
use crate::render::context::ShaderContext;

fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn close(a: Point, b: Point, tol: f64) -> bool {
    (a - b).hypot() <= tol
}

fn straight3() -> CurveWarp {
    CurveWarp::new(
        GuideCurve::new(vec![
            GuidePoint::new(p(0.0, 0.0), Vec2::new(2.0, 0.0), 1.0),
            GuidePoint::new(p(2.0, 0.0), Vec2::new(2.0, 0.0), 1.0),
            GuidePoint::new(p(4.0, 0.0), Vec2::new(2.0, 0.0), 1.0),
        ]),
        ReferenceFrame::new(p(0.0, 0.0), p(4.0, 0.0), 1.0),
    )
    .unwrap()
}

fn precise(mut warp: CurveWarp) -> CurveWarp {
    warp.set_fast(false);
    warp
}

#[test]
fn curve_midpoint_maps_to_reference_midpoint() {
    let warp = CurveWarp::default();
    let mid = warp.curve().segment(0).unwrap().eval(0.5);
    assert!(close(mid, p(0.0, 0.025), 1e-12));
    let out = warp.transform(mid);
    assert!(close(out, p(0.0, -0.4), 0.05), "{out:?}");
}

#[test]
fn single_point_curve_projects_onto_its_tangent() {
    let warp = CurveWarp::new(
        GuideCurve::new(vec![GuidePoint::new(p(0.0, 0.0), Vec2::new(1.0, 0.0), 2.0)]),
        ReferenceFrame::new(p(-2.5, -0.5), p(2.5, -0.3), 1.0),
    )
    .unwrap();
    let s = warp.transform_sample(p(5.0, 5.0), Quality::BEST);
    assert_eq!(s.distance, -5.0);
    assert_eq!(s.along, 0.0);
    let expected = warp.frame().start_point + warp.frame().perp() * -2.5;
    assert!(close(s.point, expected, 1e-12), "{s:?}");
}

#[test]
fn single_point_tangent_length_scales_distance() {
    let warp = CurveWarp::new(
        GuideCurve::new(vec![GuidePoint::new(p(0.0, 0.0), Vec2::new(2.0, 0.0), 2.0)]),
        ReferenceFrame::new(p(-2.5, -0.5), p(2.5, -0.3), 1.0),
    )
    .unwrap();
    let s = warp.transform_sample(p(5.0, 5.0), Quality::BEST);
    assert_eq!(s.distance, -10.0);
    assert_eq!(s.along, 0.0);
    let expected = warp.frame().start_point + warp.frame().perp() * -5.0;
    assert!(close(s.point, expected, 1e-12), "{s:?}");
}

#[test]
fn empty_curve_maps_everything_to_origin() {
    let warp = CurveWarp::new(
        GuideCurve::default(),
        ReferenceFrame::new(p(-1.0, 0.0), p(1.0, 0.0), 1.0),
    )
    .unwrap();
    assert_eq!(warp.transform(p(3.0, -7.0)), Point::ZERO);
}

#[test]
fn open_ends_extrapolate_linearly() {
    for warp in [straight3(), precise(straight3())] {
        let before = warp.transform_sample(p(-3.0, 0.0), Quality::BEST);
        assert!((before.along + 3.0).abs() < 0.01, "{before:?}");
        assert!(close(before.point, p(-3.0, 0.0), 0.01));

        let after = warp.transform_sample(p(7.0, 0.5), Quality::BEST);
        assert!((after.along - 7.0).abs() < 0.01, "{after:?}");
        assert!((after.distance + 0.5).abs() < 1e-9);
        assert!(close(after.point, p(7.0, 0.5), 0.01), "{after:?}");
    }
}

#[test]
fn matching_curve_and_frame_is_identity() {
    let (start, end) = (p(1.0, 1.0), p(4.0, 5.0));
    let axis = end - start;
    let curve = GuideCurve::new(vec![
        GuidePoint::new(start, axis, 1.0),
        GuidePoint::new(end, axis, 1.0),
    ]);
    let base = CurveWarp::new(curve, ReferenceFrame::new(start, end, 1.0)).unwrap();
    let perp = base.frame().perp();

    for warp in [base.clone(), precise(base.clone())] {
        for s in [0.1, 0.25, 0.5, 0.8, 1.0] {
            for off in [0.0, 0.3, -0.4] {
                let q = start + axis * s + perp * off;
                let out = warp.transform_sample(q, Quality::BEST).point;
                assert!(close(out, q, 0.02), "s={s} off={off}: {out:?} vs {q:?}");
            }
        }
    }
}

#[test]
fn width_scales_perpendicular_offset() {
    let warp = precise(
        CurveWarp::new(
            GuideCurve::new(vec![
                GuidePoint::new(p(0.0, 0.0), Vec2::new(4.0, 0.0), 1.0),
                GuidePoint::new(p(4.0, 0.0), Vec2::new(4.0, 0.0), 3.0),
            ]),
            ReferenceFrame::new(p(0.0, 0.0), p(4.0, 0.0), 1.0),
        )
        .unwrap(),
    );
    let out = warp.transform(p(1.0, -0.9));
    assert!(close(out, p(1.0, -0.6), 0.01), "{out:?}");
}

#[test]
fn perp_width_divides_offset() {
    let mut warp = precise(straight3());
    let narrow = warp.transform(p(1.0, 0.8));
    warp.set_frame(p(0.0, 0.0), p(4.0, 0.0), 2.0).unwrap();
    let wide = warp.transform(p(1.0, 0.8));
    assert!((narrow.y - 2.0 * wide.y).abs() < 1e-9, "{narrow:?} {wide:?}");
}

#[test]
fn thin_widths_are_clamped_with_sign() {
    assert_eq!(clamp_thickness(0.0), TOO_THIN);
    assert_eq!(clamp_thickness(-0.005), -TOO_THIN);
    assert_eq!(clamp_thickness(0.005), TOO_THIN);
    assert_eq!(clamp_thickness(0.5), 0.5);
    assert_eq!(clamp_thickness(-2.0), -2.0);
}

#[test]
fn zero_width_stays_finite() {
    let warp = CurveWarp::new(
        GuideCurve::new(vec![
            GuidePoint::new(p(0.0, 0.0), Vec2::new(4.0, 0.0), 0.0),
            GuidePoint::new(p(4.0, 0.0), Vec2::new(4.0, 0.0), 0.0),
        ]),
        ReferenceFrame::new(p(0.0, 0.0), p(4.0, 0.0), 1.0),
    )
    .unwrap();
    let out = warp.transform(p(2.0, -0.01));
    assert!(out.is_finite());
    assert!((out.y + 1.0).abs() < 1e-6, "{out:?}");
}

#[test]
fn split_corner_uses_averaged_tangent() {
    let warp = precise(
        CurveWarp::new(
            GuideCurve::new(vec![
                GuidePoint::new(p(0.0, 0.0), Vec2::new(2.0, 0.0), 1.0),
                GuidePoint::split(p(2.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(0.0, 2.0), 1.0),
                GuidePoint::new(p(2.0, 2.0), Vec2::new(0.0, 2.0), 1.0),
            ]),
            ReferenceFrame::new(p(0.0, 0.0), p(4.0, 0.0), 1.0),
        )
        .unwrap(),
    );
    let s = warp.transform_sample(p(3.0, -1.0), Quality::BEST);
    assert!((s.distance - 2f64.sqrt()).abs() < 1e-9, "{s:?}");
    assert!((s.along - 2.0).abs() < 1e-6, "{s:?}");
}

#[test]
fn zero_tangent_cusp_synthesises_direction() {
    let warp = precise(
        CurveWarp::new(
            GuideCurve::new(vec![
                GuidePoint::new(p(0.0, 0.0), Vec2::new(2.0, 0.0), 1.0),
                GuidePoint::new(p(2.0, 0.0), Vec2::ZERO, 1.0),
                GuidePoint::new(p(4.0, 0.0), Vec2::new(2.0, 0.0), 1.0),
            ]),
            ReferenceFrame::new(p(0.0, 0.0), p(4.0, 0.0), 1.0),
        )
        .unwrap(),
    );
    let s = warp.transform_sample(p(2.0, 1.0), Quality::BEST);
    assert!(s.point.is_finite());
    assert!((s.distance + 1.0).abs() < 1e-6, "{s:?}");
}

#[test]
fn coincident_points_fall_back_to_start() {
    let warp = CurveWarp::new(
        GuideCurve::new(vec![
            GuidePoint::new(p(1.0, 1.0), Vec2::ZERO, 1.0),
            GuidePoint::new(p(1.0, 1.0), Vec2::ZERO, 1.0),
        ]),
        ReferenceFrame::new(p(-1.0, 0.0), p(1.0, 0.0), 1.0),
    )
    .unwrap();
    assert_eq!(warp.curve().length(), 0.0);
    let out = warp.transform(p(5.0, 5.0));
    assert!(close(out, p(-1.0, 0.0), 1e-12), "{out:?}");
}

#[test]
fn origin_offsets_the_guide_curve() {
    let plain = CurveWarp::default();
    let mut shifted = plain.clone();
    shifted.set_origin(Vec2::new(10.0, 5.0)).unwrap();
    for q in [p(-1.0, 0.3), p(0.5, -0.2), p(2.0, 0.9)] {
        let a = plain.transform(q);
        let b = shifted.transform(q + Vec2::new(10.0, 5.0));
        assert!(close(a, b, 1e-6), "{a:?} vs {b:?}");
    }
}

#[test]
fn setters_validate_and_keep_previous_state() {
    assert!(matches!(
        CurveWarp::new(
            GuideCurve::default(),
            ReferenceFrame::new(p(0.0, 0.0), p(1.0, 0.0), 0.0)
        ),
        Err(WarpError::Validation(_))
    ));

    let mut warp = CurveWarp::default();
    assert!(warp.set_frame(p(0.0, 0.0), p(1.0, 0.0), f64::NAN).is_err());
    assert_eq!(warp.frame().perp_width, 1.0);

    let bad = vec![GuidePoint::new(p(f64::INFINITY, 0.0), Vec2::ZERO, 1.0)];
    assert!(warp.set_points(bad).is_err());
    let negative = vec![GuidePoint::new(p(0.0, 0.0), Vec2::ZERO, -1.0)];
    assert!(warp.set_points(negative).is_err());
    assert_eq!(warp.curve().len(), 2);

    assert!(warp.set_origin(Vec2::new(f64::NAN, 0.0)).is_err());
    assert_eq!(warp.origin(), Vec2::ZERO);
}

#[test]
fn params_roundtrip_through_layer() {
    let params = CurveWarpParams::default();
    let warp = CurveWarp::from_params(params.clone()).unwrap();
    assert_eq!(warp, CurveWarp::default());
    assert_eq!(warp.params(), params);
    assert_eq!(warp.search_mode(), SearchMode::Approximate);
    assert_eq!(precise(warp).search_mode(), SearchMode::Precise);
}

#[test]
fn color_and_hits_are_queried_at_mapped_point() {
    let warp = CurveWarp::default();
    let ctx = ShaderContext::new(|q: Point| {
        if q.x > 0.0 {
            Rgba8Premul::opaque((q.x * 40.0) as u8, 0, 0)
        } else {
            Rgba8Premul::transparent()
        }
    });
    let q = p(1.5, 0.2);
    assert_eq!(warp.get_color(&ctx, q), ctx.get_color(warp.transform(q)));
    assert!(warp.hit_check(&ctx, q).is_some());
    assert!(warp.hit_check(&ctx, p(-1.5, 0.2)).is_none());

    let bound = warp.bind(&ctx);
    assert_eq!(bound.get_color(q), warp.get_color(&ctx, q));
    assert_eq!(bound.hit_check(q), warp.hit_check(&ctx, q));
}
