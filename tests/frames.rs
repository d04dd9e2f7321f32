use cosmogen::common::vector::{self, ZERO};
use cosmogen::hierarchy::{Hierarchy, HierarchyError, Node, NodeId, Shape};

fn sphere(kind: &str, radius: f64) -> Node {
    Node::new(kind, Shape::Sphere { radius }, 1.0)
}

struct Tree {
    hierarchy: Hierarchy,
    root: NodeId,
    a: NodeId,
    b: NodeId,
    c: NodeId,
}

/// root (1e6 m) ─┬─ a (1e3 m) ── b (10 m)
///               └─ c (1e4 m)
fn tree() -> Tree {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.insert_root(sphere("root", 1.0e6));
    let a = hierarchy
        .attach(root, sphere("a", 1.0e3), [100.0, 0.0, 0.0])
        .unwrap();
    let b = hierarchy
        .attach(a, sphere("b", 10.0), [2000.0, 0.0, 0.0])
        .unwrap();
    let c = hierarchy
        .attach(root, sphere("c", 1.0e4), [-300.0, 50.0, 0.0])
        .unwrap();
    Tree {
        hierarchy,
        root,
        a,
        b,
        c,
    }
}

#[test]
fn local_scale_follows_containing_radius() {
    let t = tree();
    let scale = |id| t.hierarchy.get(id).unwrap().local_scale();
    assert_eq!(scale(t.root), 1.0);
    assert!((scale(t.a) - 1.0e-3).abs() < 1e-18);
    let point = Node::new("dust", Shape::Point, 0.0);
    assert!(point.local_scale() > 0.0);
}

#[test]
fn translation_round_trips_across_branches() {
    let t = tree();
    for p in [[1.0, 2.0, 3.0], [-4.0e5, 1.0e3, 7.5], ZERO] {
        let there = t.hierarchy.translate(t.b, t.c, p).unwrap();
        let back = t.hierarchy.translate(t.c, t.b, there).unwrap();
        assert!(
            vector::approx_eq(&back, &p, 1e-6),
            "{p:?} came back as {back:?}"
        );
    }
}

#[test]
fn translation_to_self_is_identity() {
    let t = tree();
    let p = [1.5, -2.5, 3.5];
    assert_eq!(t.hierarchy.translate(t.b, t.b, p).unwrap(), p);
}

#[test]
fn translation_composes_one_level_at_a_time() {
    let t = tree();
    // b's origin sits 2000 units into a's frame, i.e. 2 units of root.
    let b_in_root = t.hierarchy.position_in(t.b, t.root).unwrap();
    assert!(vector::approx_eq(&b_in_root, &[102.0, 0.0, 0.0], 1e-9));
    let root_in_b = t.hierarchy.translate(t.root, t.b, b_in_root).unwrap();
    assert!(vector::approx_eq(&root_in_b, &ZERO, 1e-6));
}

#[test]
fn distance_uses_common_ancestor_scale() {
    let t = tree();
    let d = t.hierarchy.distance(t.b, t.c).unwrap();
    let expected = (402.0_f64.powi(2) + 50.0_f64.powi(2)).sqrt();
    assert!((d - expected).abs() < 1e-6, "distance {d}");
    assert!((t.hierarchy.distance(t.a, t.b).unwrap() - 2.0).abs() < 1e-9);
    assert_eq!(t.hierarchy.distance(t.c, t.c).unwrap(), 0.0);
}

#[test]
fn disjoint_trees_have_no_distance() {
    let mut hierarchy = Hierarchy::new();
    let a = hierarchy.insert_root(sphere("a", 1.0));
    let b = hierarchy.insert_root(sphere("b", 1.0));
    assert!(hierarchy.find_common_ancestor(a, b).is_none());
    assert!(matches!(
        hierarchy.distance(a, b),
        Err(HierarchyError::NotInSameHierarchy { .. })
    ));
    assert!(matches!(
        hierarchy.translate(a, b, ZERO),
        Err(HierarchyError::NotInSameHierarchy { .. })
    ));
}

#[test]
fn common_ancestor_is_deepest_shared_node() {
    let t = tree();
    assert_eq!(t.hierarchy.find_common_ancestor(t.b, t.c), Some(t.root));
    assert_eq!(t.hierarchy.find_common_ancestor(t.b, t.a), Some(t.a));
    assert_eq!(t.hierarchy.root_path(t.b), vec![t.root, t.a, t.b]);
}

#[test]
fn reparent_to_ancestor_keeps_physical_position() {
    let mut t = tree();
    let before = t.hierarchy.position_in(t.b, t.c).unwrap();
    t.hierarchy.reparent(t.b, t.root).unwrap();
    assert_eq!(t.hierarchy.parent(t.b), Some(t.root));
    assert!(!t.hierarchy.children(t.a).contains(&t.b));
    let position = t.hierarchy.get(t.b).unwrap().position();
    assert!(vector::approx_eq(&position, &[102.0, 0.0, 0.0], 1e-9));
    let after = t.hierarchy.position_in(t.b, t.c).unwrap();
    assert!(vector::approx_eq(&before, &after, 1e-6));
}

#[test]
fn reparent_elsewhere_resets_to_origin() {
    let mut t = tree();
    t.hierarchy.reparent(t.b, t.c).unwrap();
    assert_eq!(t.hierarchy.get(t.b).unwrap().position(), ZERO);
    assert!(t.hierarchy.children(t.c).contains(&t.b));
}

#[test]
fn reparent_under_descendant_is_rejected() {
    let mut t = tree();
    assert!(matches!(
        t.hierarchy.reparent(t.a, t.b),
        Err(HierarchyError::CyclicReparent { .. })
    ));
    assert_eq!(t.hierarchy.parent(t.a), Some(t.root));
}

#[test]
fn detached_subtree_is_its_own_hierarchy() {
    let mut t = tree();
    t.hierarchy.detach(t.a).unwrap();
    assert!(matches!(
        t.hierarchy.distance(t.b, t.c),
        Err(HierarchyError::NotInSameHierarchy { .. })
    ));
    // Still navigable internally.
    assert!((t.hierarchy.distance(t.a, t.b).unwrap() - 2.0).abs() < 1e-9);
}

#[test]
fn discard_removes_whole_subtree() {
    let mut t = tree();
    assert_eq!(t.hierarchy.discard(t.a).unwrap(), 2);
    assert!(!t.hierarchy.contains(t.b));
    assert_eq!(t.hierarchy.children(t.root), &[t.c]);
    assert!(matches!(
        t.hierarchy.set_position(t.b, ZERO),
        Err(HierarchyError::UnknownNode(_))
    ));
}
