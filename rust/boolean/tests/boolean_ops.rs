// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end boolean operations on boxes.

use approx::assert_relative_eq;
use paver_boolean::{
    perform, perform_with_progress, AlertKind, BooleanOp, BooleanOptions, BooleanResult, CancellationToken,
    FailureMode, Operation, Status,
};
use nalgebra::{Point3, Vector3};
use paver_topology::builders::box_faces;
use paver_topology::{EdgeKey, Oriented, Plane, ShapeArena, ShapeKey, ShapeType};

/// Logs of the run go to the test output with `RUST_LOG=paver_boolean=debug`.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .with_test_writer()
        .try_init();
}

fn boxes(a: ([f64; 3], [f64; 3]), b: ([f64; 3], [f64; 3])) -> (ShapeArena, ShapeKey, ShapeKey) {
    let mut arena = ShapeArena::new();
    let (sa, _, _) = arena.make_box(a.0, a.1).unwrap();
    let (sb, _, _) = arena.make_box(b.0, b.1).unwrap();
    (arena, sa.into(), sb.into())
}

fn run(arena: &mut ShapeArena, op: Operation, a: ShapeKey, b: ShapeKey) -> BooleanResult {
    init_logging();
    perform(arena, op, &[a], &[b], &BooleanOptions::default()).unwrap()
}

fn count(arena: &ShapeArena, shape: ShapeKey, ty: ShapeType) -> usize {
    arena.explode(shape, ty).len()
}

const UNIT: ([f64; 3], [f64; 3]) = ([0.0; 3], [1.0; 3]);
const OFFSET: ([f64; 3], [f64; 3]) = ([0.5, 0.0, 0.0], [1.5, 1.0, 1.0]);
const CORNER: ([f64; 3], [f64; 3]) = ([0.5; 3], [1.5; 3]);

// ============================================================================
// Overlapping boxes
// ============================================================================

#[test]
fn offset_cubes_common() {
    let (mut arena, a, b) = boxes(UNIT, OFFSET);
    let result = run(&mut arena, Operation::Common, a, b);
    assert_eq!(result.status, Status::Done);
    let shape = result.shape.unwrap();
    assert_relative_eq!(arena.volume(shape), 0.5, epsilon = 1e-9);
    assert_eq!(count(&arena, shape, ShapeType::Face), 6);
    assert_eq!(count(&arena, shape, ShapeType::Solid), 1);
}

#[test]
fn offset_cubes_fuse() {
    let (mut arena, a, b) = boxes(UNIT, OFFSET);
    let result = run(&mut arena, Operation::Fuse, a, b);
    assert_eq!(result.status, Status::Done);
    let shape = result.shape.unwrap();
    assert_relative_eq!(arena.volume(shape), 1.5, epsilon = 1e-9);
    // The side faces stay split where the operands overlapped.
    assert_eq!(count(&arena, shape, ShapeType::Face), 14);
    assert_relative_eq!(arena.surface_area(shape), 8.0, epsilon = 1e-9);
}

#[test]
fn offset_cubes_cut_both_ways() {
    let (mut arena, a, b) = boxes(UNIT, OFFSET);
    let cut = run(&mut arena, Operation::Cut, a, b);
    assert_eq!(cut.status, Status::Done);
    let shape = cut.shape.unwrap();
    assert_relative_eq!(arena.volume(shape), 0.5, epsilon = 1e-9);
    assert_eq!(count(&arena, shape, ShapeType::Face), 6);

    let reverse = run(&mut arena, Operation::CutReverse, a, b);
    assert_relative_eq!(arena.volume(reverse.shape.unwrap()), 0.5, epsilon = 1e-9);
}

#[test]
fn offset_cubes_section() {
    let (mut arena, a, b) = boxes(UNIT, OFFSET);
    let result = run(&mut arena, Operation::Section, a, b);
    assert_eq!(result.status, Status::Done);
    let shape = result.shape.unwrap();
    assert_eq!(shape.shape_type(), ShapeType::Compound);
    // Two square loops at x = 0.5 and x = 1 plus the four shared half
    // edges.
    assert_eq!(count(&arena, shape, ShapeType::Edge), 12);
    assert_relative_eq!(arena.total_length(shape), 10.0, epsilon = 1e-9);

    // The edges in the plane x = 1 close around the interface square.
    let on_plane: Vec<EdgeKey> = arena
        .explode(shape, ShapeType::Edge)
        .into_iter()
        .filter_map(|k| k.as_edge())
        .filter(|&e| {
            let data = arena.edge(e).unwrap();
            [data.start, data.end]
                .iter()
                .all(|&v| (arena.vertex_point(v).unwrap().x - 1.0).abs() < 1e-9)
        })
        .collect();
    assert_eq!(on_plane.len(), 4);
    let usages = chain(&arena, &on_plane);
    let wire = arena.add_wire(&usages).unwrap();
    let face: ShapeKey = arena.add_face(wire).unwrap().into();
    assert_relative_eq!(arena.surface_area(face), 1.0, epsilon = 1e-9);
    assert_eq!(arena.volume(face), 0.0);
}

/// Orders connected edges into a loop.
fn chain(arena: &ShapeArena, edges: &[EdgeKey]) -> Vec<Oriented<EdgeKey>> {
    let mut left = edges.to_vec();
    let first = left.remove(0);
    let mut usages = vec![Oriented::forward(first)];
    let mut end = arena.edge(first).unwrap().end;
    while !left.is_empty() {
        let i = left
            .iter()
            .position(|&e| {
                let data = arena.edge(e).unwrap();
                data.start == end || data.end == end
            })
            .unwrap();
        let edge = left.remove(i);
        let data = arena.edge(edge).unwrap();
        if data.start == end {
            usages.push(Oriented::forward(edge));
            end = data.end;
        } else {
            usages.push(Oriented::reversed_of(edge));
            end = data.start;
        }
    }
    usages
}

#[test]
fn corner_cubes() {
    let expected = [
        (Operation::Common, 0.125, 6),
        (Operation::Fuse, 1.875, 12),
        (Operation::Cut, 0.875, 9),
    ];
    for (op, volume, faces) in expected {
        let (mut arena, a, b) = boxes(UNIT, CORNER);
        let result = run(&mut arena, op, a, b);
        assert_eq!(result.status, Status::Done, "{op:?}");
        let shape = result.shape.unwrap();
        assert_relative_eq!(arena.volume(shape), volume, epsilon = 1e-9);
        assert_eq!(count(&arena, shape, ShapeType::Face), faces, "{op:?}");
    }
}

#[test]
fn box_resting_on_top_fuses() {
    let (mut arena, a, b) = boxes(UNIT, ([0.25, 0.25, 1.0], [0.75, 0.75, 2.0]));
    let result = run(&mut arena, Operation::Fuse, a, b);
    assert_eq!(result.status, Status::Done);
    let shape = result.shape.unwrap();
    assert_relative_eq!(arena.volume(shape), 1.25, epsilon = 1e-9);
    // The top face of the lower box keeps a square hole.
    let holed = arena
        .explode(shape, ShapeType::Face)
        .into_iter()
        .filter_map(|f| f.as_face())
        .filter(|&f| !arena.face(f).unwrap().inner_wires.is_empty())
        .count();
    assert_eq!(holed, 1);
}

#[test]
fn cavity_is_cut_out() {
    let (mut arena, a, b) = boxes(([0.0; 3], [3.0; 3]), ([1.0; 3], [2.0; 3]));
    let result = run(&mut arena, Operation::Cut, a, b);
    assert_eq!(result.status, Status::Done);
    let shape = result.shape.unwrap();
    assert_relative_eq!(arena.volume(shape), 26.0, epsilon = 1e-9);
    let solid = shape.as_solid().unwrap();
    assert_eq!(arena.solid(solid).unwrap().inner_shells.len(), 1);

    let fused = run(&mut arena, Operation::Fuse, a, b);
    assert_relative_eq!(arena.volume(fused.shape.unwrap()), 27.0, epsilon = 1e-9);
    let common = run(&mut arena, Operation::Common, a, b);
    assert_relative_eq!(arena.volume(common.shape.unwrap()), 1.0, epsilon = 1e-9);
}

// ============================================================================
// Degenerate and coincident operands
// ============================================================================

#[test]
fn disjoint_operands() {
    let (mut arena, a, b) = boxes(UNIT, ([3.0; 3], [4.0; 3]));
    let common = run(&mut arena, Operation::Common, a, b);
    assert_eq!(common.status, Status::Done);
    let shape = common.shape.unwrap();
    assert_eq!(shape.shape_type(), ShapeType::Compound);
    assert_eq!(count(&arena, shape, ShapeType::Face), 0);
    for face in arena.explode(a, ShapeType::Face) {
        assert!(common.history.is_deleted(face));
    }

    let fused = run(&mut arena, Operation::Fuse, a, b);
    let shape = fused.shape.unwrap();
    assert_eq!(count(&arena, shape, ShapeType::Solid), 2);
    assert_relative_eq!(arena.volume(shape), 2.0, epsilon = 1e-9);
    // Nothing was split: every face stands for itself.
    for face in arena.explode(a, ShapeType::Face) {
        assert_eq!(fused.history.images(face), &[face]);
    }
}

#[test]
fn identical_copies_keep_one() {
    let mut arena = ShapeArena::new();
    let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
    let copy = arena.deep_copy(a.into()).unwrap();
    let result = run(&mut arena, Operation::Common, a.into(), copy);
    assert_eq!(result.status, Status::Done);
    let shape = result.shape.unwrap();
    assert_relative_eq!(arena.volume(shape), 1.0, epsilon = 1e-9);
    assert_eq!(count(&arena, shape, ShapeType::Face), 6);

    let fused = run(&mut arena, Operation::Fuse, a.into(), copy);
    assert_eq!(count(&arena, fused.shape.unwrap(), ShapeType::Face), 6);
    // Dropped copies point at the kept ones.
    for face in arena.explode(copy, ShapeType::Face) {
        assert_eq!(fused.history.images(face).len(), 1);
    }
}

#[test]
fn same_shape_as_both_operands() {
    let mut arena = ShapeArena::new();
    let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
    let a: ShapeKey = a.into();
    let common = run(&mut arena, Operation::Common, a, a);
    assert_eq!(common.status, Status::Done);
    assert!(common.report.alerts().is_empty());
    assert_relative_eq!(arena.volume(common.shape.unwrap()), 1.0, epsilon = 1e-9);
    let cut = run(&mut arena, Operation::Cut, a, a);
    assert_eq!(count(&arena, cut.shape.unwrap(), ShapeType::Solid), 0);
}

#[test]
fn nearly_coincident_boxes_merge_with_fuzzy_value() {
    let (mut arena, a, b) = boxes(UNIT, ([2e-6, 0.0, 0.0], [1.0 + 2e-6, 1.0, 1.0]));
    let options = BooleanOptions::default().with_fuzzy_value(1e-5);
    let result = perform(&mut arena, Operation::Common, &[a], &[b], &options).unwrap();
    assert!(result.is_done());
    let shape = result.shape.unwrap();
    assert_relative_eq!(arena.volume(shape), 1.0, epsilon = 1e-5);
    assert_eq!(count(&arena, shape, ShapeType::Face), 6);
    // Merged vertices cover the vertices they replace.
    for v in arena.explode(a, ShapeType::Vertex).into_iter().filter_map(|k| k.as_vertex()) {
        let original = arena.vertex(v).unwrap().clone();
        for &image in result.history.images(v.into()) {
            let merged = arena.vertex(image.as_vertex().unwrap()).unwrap();
            let gap = (merged.point - original.point).norm();
            assert!(gap + original.tolerance <= merged.tolerance + 1e-12);
        }
    }
}

#[test]
fn flat_solid_is_dropped_in_best_effort_mode() {
    let mut arena = ShapeArena::new();
    let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
    let square = vec![[3.0, 0.0, 0.5], [4.0, 0.0, 0.5], [4.0, 1.0, 0.5], [3.0, 1.0, 0.5]];
    let mut flipped = square.clone();
    flipped.reverse();
    let flat = arena.make_polyhedron(&[square, flipped], 1e-9).unwrap();

    let result = perform(&mut arena, Operation::Fuse, &[a.into()], &[flat.into()], &BooleanOptions::default())
        .unwrap();
    assert_eq!(result.status, Status::DoneWithAlerts);
    assert!(result.report.contains(AlertKind::ShellSplitterFailed));
    assert_relative_eq!(arena.volume(result.shape.unwrap()), 1.0, epsilon = 1e-9);

    let strict = BooleanOptions::default().with_failure_mode(FailureMode::Strict);
    let result = perform(&mut arena, Operation::Fuse, &[a.into()], &[flat.into()], &strict).unwrap();
    assert_eq!(result.status, Status::NotDone);
    assert!(result.shape.is_none());
}

// ============================================================================
// Pipeline properties
// ============================================================================

#[test]
fn cancelled_operation_is_not_done() {
    let (mut arena, a, b) = boxes(UNIT, OFFSET);
    let token = CancellationToken::new();
    token.cancel();
    let result = perform_with_progress(
        &mut arena,
        Operation::Fuse,
        &[a],
        &[b],
        &BooleanOptions::default(),
        &token,
    )
    .unwrap();
    assert_eq!(result.status, Status::NotDone);
    assert!(result.shape.is_none());
    assert_eq!(result.report.of_kind(AlertKind::UserBreak).count(), 1);
}

#[test]
fn history_has_one_entry_per_operand_sub_shape() {
    let (mut arena, a, b) = boxes(UNIT, CORNER);
    let mut expected = 0;
    for root in [a, b] {
        for ty in [
            ShapeType::Vertex,
            ShapeType::Edge,
            ShapeType::Wire,
            ShapeType::Face,
            ShapeType::Shell,
            ShapeType::Solid,
        ] {
            expected += arena.explode(root, ty).len();
        }
    }
    let result = run(&mut arena, Operation::Fuse, a, b);
    assert_eq!(result.history.len(), expected);
    let shape = result.shape.unwrap();
    let present = arena.explode(shape, ShapeType::Face);
    for (key, entry) in result.history.iter() {
        assert!(result.history.contains(key));
        if key.shape_type() == ShapeType::Face {
            assert!(entry.images.iter().all(|f| present.contains(f)));
        }
    }
    // Three faces of the first cube are cut in two by the corner cube.
    let split = arena
        .explode(a, ShapeType::Face)
        .into_iter()
        .filter(|&f| result.history.is_split(f))
        .count();
    assert_eq!(split, 3);
}

#[test]
fn results_do_not_depend_on_parallelism() {
    let measure = |parallel: bool| {
        let (mut arena, a, b) = boxes(UNIT, CORNER);
        let options = BooleanOptions::default().with_parallel(parallel);
        let result = BooleanOp::new(Operation::Fuse)
            .object(a)
            .tool(b)
            .options(options)
            .run(&mut arena)
            .unwrap();
        let shape = result.shape.unwrap();
        (
            result.status,
            count(&arena, shape, ShapeType::Face),
            count(&arena, shape, ShapeType::Edge),
            arena.volume(shape),
        )
    };
    let (s1, f1, e1, v1) = measure(true);
    let (s2, f2, e2, v2) = measure(false);
    assert_eq!((s1, f1, e1), (s2, f2, e2));
    assert_relative_eq!(v1, v2, epsilon = 1e-12);
}

#[test]
fn result_can_be_an_operand_again() {
    let (mut arena, a, b) = boxes(UNIT, OFFSET);
    let fused = run(&mut arena, Operation::Fuse, a, b).shape.unwrap();
    let (c, _, _) = arena.make_box([0.0, 0.0, 0.5], [1.5, 1.0, 1.5]).unwrap();
    let result = run(&mut arena, Operation::Common, fused, c.into());
    assert!(result.is_done());
    assert_relative_eq!(arena.volume(result.shape.unwrap()), 0.75, epsilon = 1e-9);
}

// ============================================================================
// Several solids per argument
// ============================================================================

const SLAB: ([f64; 3], [f64; 3]) = ([0.5, 0.25, 0.25], [1.5, 1.25, 1.25]);
const ROD: ([f64; 3], [f64; 3]) = ([0.125, 0.375, 0.375], [1.75, 0.625, 0.625]);

/// Two overlapping objects and a rod crossing both.
fn two_objects_and_a_rod() -> (ShapeArena, [ShapeKey; 2], ShapeKey) {
    let mut arena = ShapeArena::new();
    let (a1, _, _) = arena.make_box(UNIT.0, UNIT.1).unwrap();
    let (a2, _, _) = arena.make_box(SLAB.0, SLAB.1).unwrap();
    let (b, _, _) = arena.make_box(ROD.0, ROD.1).unwrap();
    (arena, [a1.into(), a2.into()], b.into())
}

#[test]
fn overlapping_objects_act_as_their_union() {
    init_logging();
    for (op, volume) in [
        (Operation::Fuse, 1.734375),
        (Operation::Common, 0.0859375),
        (Operation::Cut, 1.6328125),
        (Operation::CutReverse, 0.015625),
    ] {
        let (mut arena, objects, rod) = two_objects_and_a_rod();
        let result = perform(&mut arena, op, &objects, &[rod], &BooleanOptions::default()).unwrap();
        assert_eq!(result.status, Status::Done, "{op:?}");
        assert!(!result.report.contains(AlertKind::SelfInterferingShape));
        assert_relative_eq!(arena.volume(result.shape.unwrap()), volume, epsilon = 1e-9);
    }
}

#[test]
fn overlapping_solids_of_one_compound_are_reported() {
    init_logging();
    let mut arena = ShapeArena::new();
    let (a1, _, _) = arena.make_box(UNIT.0, UNIT.1).unwrap();
    let (a2, _, _) = arena.make_box(SLAB.0, SLAB.1).unwrap();
    let (far, _, _) = arena.make_box([3.0; 3], [4.0; 3]).unwrap();
    let compound: ShapeKey = arena.add_compound(vec![a1.into(), a2.into()]).unwrap().into();

    let result = perform(&mut arena, Operation::Fuse, &[compound], &[far.into()], &BooleanOptions::default())
        .unwrap();
    assert_eq!(result.status, Status::DoneWithAlerts);
    let alert = result.report.of_kind(AlertKind::SelfInterferingShape).next().unwrap();
    assert!(alert.shapes.contains(&a1.into()) && alert.shapes.contains(&a2.into()));
    assert_relative_eq!(arena.volume(result.shape.unwrap()), 2.71875, epsilon = 1e-9);

    let result = perform(&mut arena, Operation::Fuse, &[compound], &[far.into()], &BooleanOptions::strict()).unwrap();
    assert_eq!(result.status, Status::NotDone);
    assert!(result.shape.is_none());
}

// ============================================================================
// Degenerate input
// ============================================================================

/// Square face on `plane` with corners `(lo, lo)` and `(hi, hi)` in x/y.
fn square_on(arena: &mut ShapeArena, plane: Plane, z: f64, lo: f64, hi: f64) -> ShapeKey {
    let corners = [[lo, lo], [hi, lo], [hi, hi], [lo, hi]];
    let vertices: Vec<_> = corners
        .iter()
        .map(|&[x, y]| arena.add_vertex(Point3::new(x, y, z)))
        .collect();
    let edges: Vec<_> = (0..4)
        .map(|i| arena.add_edge(vertices[i], vertices[(i + 1) % 4]).unwrap())
        .collect();
    let wire = arena.add_wire_from_edges(&edges).unwrap();
    arena.add_face_on(plane, wire, Vec::new(), 1e-7).unwrap().into()
}

#[test]
fn failing_face_pair_does_not_stop_the_run() {
    init_logging();
    let (mut arena, a, b) = boxes(UNIT, CORNER);
    let broken = Plane {
        origin: Point3::new(0.5, 0.5, 0.25),
        normal: Vector3::new(f64::NAN, 0.0, 0.0),
        u_axis: Vector3::x(),
        v_axis: Vector3::y(),
    };
    let face = square_on(&mut arena, broken, 0.25, -1.0, 2.0);

    let result = perform(&mut arena, Operation::Section, &[a], &[face, b], &BooleanOptions::default()).unwrap();
    assert_eq!(result.status, Status::DoneWithAlerts);
    assert!(result.report.contains(AlertKind::NumericNonConvergence));
    // The two boxes still meet along their usual six edges.
    assert_eq!(count(&arena, result.shape.unwrap(), ShapeType::Edge), 6);
}

#[test]
fn open_shell_operand_is_not_done() {
    init_logging();
    let mut arena = ShapeArena::new();
    let (_, _, faces) = arena.make_box(UNIT.0, UNIT.1).unwrap();
    // No bottom face.
    let usages: Vec<_> = faces[1..].iter().map(|&f| Oriented::forward(f)).collect();
    let shell = arena.add_shell(&usages).unwrap();
    let open = arena.add_solid(shell).unwrap();
    let (b, _, _) = arena.make_box(CORNER.0, CORNER.1).unwrap();

    let result = perform(&mut arena, Operation::Fuse, &[open.into()], &[b.into()], &BooleanOptions::default())
        .unwrap();
    assert_eq!(result.status, Status::NotDone);
    assert!(result.report.contains(AlertKind::OpenShellForClassification));
    assert!(result.shape.is_none());
}

#[test]
fn nearly_coplanar_faces_are_ambiguous() {
    init_logging();
    let mut arena = ShapeArena::new();
    let (a, _, _) = arena.make_box(UNIT.0, UNIT.1).unwrap();
    // Top face tilted about the line x = 0.5 by less than the tolerance
    // over the face, but too much to count as parallel.
    let tilted: Vec<Vec<[f64; 3]>> = box_faces([0.25, 0.25, 0.5], [0.75, 0.75, 1.0])
        .into_iter()
        .map(|face| {
            face.into_iter()
                .map(|[x, y, z]| if z == 1.0 { [x, y, 1.0 + 4e-7 * (x - 0.5)] } else { [x, y, z] })
                .collect()
        })
        .collect();
    let b = arena.make_polyhedron(&tilted, 1e-9).unwrap();

    let result = perform(&mut arena, Operation::Fuse, &[a.into()], &[b.into()], &BooleanOptions::default())
        .unwrap();
    assert!(result.report.contains(AlertKind::AmbiguousClassification));

    let result = perform(&mut arena, Operation::Fuse, &[a.into()], &[b.into()], &BooleanOptions::strict()).unwrap();
    assert_eq!(result.status, Status::NotDone);
    assert!(result.report.contains(AlertKind::AmbiguousClassification));
}

#[test]
fn inside_out_operand_cannot_be_oriented() {
    init_logging();
    let mut arena = ShapeArena::new();
    let (a, _, _) = arena.make_box(UNIT.0, UNIT.1).unwrap();
    let (_, _, faces) = arena.make_box(CORNER.0, CORNER.1).unwrap();
    let usages: Vec<_> = faces.iter().map(|&f| Oriented::reversed_of(f)).collect();
    let shell = arena.add_shell(&usages).unwrap();
    let inverted = arena.add_solid(shell).unwrap();

    let result = perform(&mut arena, Operation::Fuse, &[a.into()], &[inverted.into()], &BooleanOptions::default())
        .unwrap();
    assert_ne!(result.status, Status::Done);
    // Kept faces of the two operands run the same way along each section edge.
    assert!(result.report.contains(AlertKind::UnableToOrientTheShape));
}

#[test]
fn vertices_merged_along_an_edge_leave_a_tiny_section() {
    init_logging();
    let mut arena = ShapeArena::new();
    // A lone edge along the x axis.
    let e0 = arena.add_vertex(Point3::origin());
    let e1 = arena.add_vertex(Point3::new(1.0, 0.0, 0.0));
    let edge = arena.add_edge(e0, e1).unwrap();

    // A face in z = 0 whose boundary runs along the edge through three
    // vertices closer to each other than their tolerances.
    let points = [
        Point3::new(0.3, 0.0, 0.0),
        Point3::new(0.300_000_15, 0.0, 0.0),
        Point3::new(0.300_000_3, 0.0, 0.0),
        Point3::new(0.4, 0.5, 0.0),
    ];
    let vertices: Vec<_> = points.iter().map(|&p| arena.add_vertex(p)).collect();
    let edges: Vec<_> = (0..4)
        .map(|i| arena.add_edge(vertices[i], vertices[(i + 1) % 4]).unwrap())
        .collect();
    let wire = arena.add_wire_from_edges(&edges).unwrap();
    let fan = arena.add_face(wire).unwrap();

    // A wide face in y = 0 containing the edge.
    let corners = [[-1.0, -1.0], [2.0, -1.0], [2.0, 1.0], [-1.0, 1.0]];
    let vertices: Vec<_> = corners
        .iter()
        .map(|&[x, z]| arena.add_vertex(Point3::new(x, 0.0, z)))
        .collect();
    let edges: Vec<_> = (0..4)
        .map(|i| arena.add_edge(vertices[i], vertices[(i + 1) % 4]).unwrap())
        .collect();
    let wire = arena.add_wire_from_edges(&edges).unwrap();
    let wall = arena.add_face(wire).unwrap();

    let result = perform(
        &mut arena,
        Operation::Section,
        &[edge.into()],
        &[fan.into(), wall.into()],
        &BooleanOptions::default(),
    )
    .unwrap();
    assert_ne!(result.status, Status::NotDone);
    assert!(result.report.contains(AlertKind::TinyEdge));
}

#[test]
fn unused_edge_inside_a_face_fails_strict_mode() {
    init_logging();
    let mut arena = ShapeArena::new();
    let (a, _, _) = arena.make_box(UNIT.0, UNIT.1).unwrap();
    // Triangular prism standing on its ridge, which lies inside the top
    // face of the box.
    let (x0, x1) = (0.25, 0.75);
    let ridge = |x: f64| [x, 0.5, 1.0];
    let left = |x: f64| [x, 0.25, 1.5];
    let right = |x: f64| [x, 0.75, 1.5];
    let prism = vec![
        vec![ridge(x0), left(x0), right(x0)],
        vec![ridge(x1), right(x1), left(x1)],
        vec![left(x0), left(x1), right(x1), right(x0)],
        vec![ridge(x0), ridge(x1), left(x1), left(x0)],
        vec![ridge(x0), right(x0), right(x1), ridge(x1)],
    ];
    let b = arena.make_polyhedron(&prism, 1e-9).unwrap();

    let result = perform(&mut arena, Operation::Fuse, &[a.into()], &[b.into()], &BooleanOptions::default())
        .unwrap();
    assert!(result.report.contains(AlertKind::FaceBuilderUnusedEdges));

    let result = perform(&mut arena, Operation::Fuse, &[a.into()], &[b.into()], &BooleanOptions::strict()).unwrap();
    assert_eq!(result.status, Status::NotDone);
    assert!(result.report.contains(AlertKind::FaceBuilderUnusedEdges));
}
