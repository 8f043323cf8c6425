use featdoc_graph::{DependencyGraph, ObjectId};
use proptest::prelude::*;

fn build(node_count: u64, edges: &[(u64, u64)]) -> DependencyGraph {
    let mut g = DependencyGraph::new();
    for raw in 0..node_count {
        g.add_node(ObjectId::new(raw));
    }
    for from in 0..node_count {
        let targets: Vec<ObjectId> = edges
            .iter()
            .filter(|(a, _)| *a == from)
            .map(|(_, b)| ObjectId::new(*b))
            .collect();
        g.set_out_edges(ObjectId::new(from), targets).unwrap();
    }
    g
}

proptest! {
    #[test]
    fn out_and_in_lists_agree(
        node_count in 1..20u64,
        edges in proptest::collection::vec((0..20u64, 0..20u64), 0..60)
    ) {
        let edges: Vec<_> = edges
            .into_iter()
            .filter(|(a, b)| *a < node_count && *b < node_count)
            .collect();
        let g = build(node_count, &edges);

        for raw in 0..node_count {
            let a = ObjectId::new(raw);
            for b in g.out_list(a) {
                prop_assert!(g.in_list(b).contains(&a));
            }
            for b in g.in_list(a) {
                prop_assert!(g.out_list(b).contains(&a));
            }
        }
    }

    #[test]
    fn topological_order_respects_every_edge(
        node_count in 1..20u64,
        edges in proptest::collection::vec((0..20u64, 0..20u64), 0..60)
    ) {
        // lower id -> higher id keeps the graph acyclic
        let edges: Vec<_> = edges
            .into_iter()
            .filter(|(a, b)| *a < node_count && *b < node_count && a < b)
            .collect();
        let g = build(node_count, &edges);
        let order = g.topological_order();
        prop_assert_eq!(order.len() as u64, node_count);

        let position = |id: ObjectId| order.iter().position(|o| *o == id).unwrap();
        for (a, b) in &edges {
            prop_assert!(position(ObjectId::new(*a)) < position(ObjectId::new(*b)));
        }
    }

    #[test]
    fn order_covers_cyclic_graphs(
        node_count in 1..15u64,
        edges in proptest::collection::vec((0..15u64, 0..15u64), 0..60)
    ) {
        let edges: Vec<_> = edges
            .into_iter()
            .filter(|(a, b)| *a < node_count && *b < node_count)
            .collect();
        let g = build(node_count, &edges);
        let mut order = g.topological_order();
        order.sort();
        order.dedup();
        prop_assert_eq!(order.len() as u64, node_count);
    }
}

#[test]
fn removing_a_node_removes_it_from_in_lists() {
    let mut g = build(3, &[(0, 2), (1, 2)]);
    g.remove_node(ObjectId::new(0));
    assert_eq!(g.in_list(ObjectId::new(2)), vec![ObjectId::new(1)]);
    assert_eq!(g.roots(), vec![ObjectId::new(1)]);
}
