use protgraph::annotation::normalize;
use protgraph::engine::{neighborhood, GraphMaintainer, NeighborhoodQuery};
use protgraph::graph::{Edge, GraphBackend, GraphStore, ProteinId};
use protgraph::model::{Protein, RawProteinRecord};

fn record(id: &str, interpro: &str) -> RawProteinRecord {
    RawProteinRecord {
        id: Some(id.to_string()),
        display_name: Some(format!("{}_HUMAN", id)),
        interpro: Some(interpro.to_string()),
        ..Default::default()
    }
}

fn edges<G: GraphBackend>(graph: &G) -> Vec<(String, String, f64, Vec<String>)> {
    let mut edges: Vec<_> = graph
        .scan_edges()
        .unwrap()
        .into_iter()
        .map(|e: Edge| {
            (
                e.source.as_str().to_string(),
                e.target.as_str().to_string(),
                e.weight,
                e.shared_domains,
            )
        })
        .collect();
    edges.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
    edges
}

const CORPUS: &[(&str, &str)] = &[
    ("P01", "IPR1;IPR2;IPR3"),
    ("P02", "IPR2;IPR3"),
    ("P03", "IPR3;IPR4"),
    ("P04", "IPR9"),
    ("P05", ""),
    ("P06", "IPR1;IPR4;IPR5"),
    ("P07", "IPR5"),
];

#[test]
fn test_disjoint_domains_never_linked() {
    let mut engine = GraphMaintainer::new(GraphStore::new());
    for _ in 0..2 {
        engine.add_protein(&record("A", "IPR1;IPR2")).unwrap();
        engine.add_protein(&record("B", "IPR3;IPR4")).unwrap();
        engine.add_protein(&record("C", "")).unwrap();
    }
    assert_eq!(GraphBackend::edge_count(engine.graph()).unwrap(), 0);
    assert_eq!(GraphBackend::node_count(engine.graph()).unwrap(), 3);
}

#[test]
fn test_reference_weight() {
    let mut engine = GraphMaintainer::new(GraphStore::new());
    engine.add_protein(&record("A", "X;Y")).unwrap();
    engine.add_protein(&record("B", "Y;Z")).unwrap();

    let edges = edges(engine.graph());
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].2, 1.0 / 3.0);
    assert_eq!(edges[0].3, vec!["Y".to_string()]);
}

#[test]
fn test_weights_symmetric_and_bounded() {
    let mut engine = GraphMaintainer::new(GraphStore::new());
    for (id, domains) in CORPUS {
        engine.add_protein(&record(id, domains)).unwrap();
    }

    let graph = engine.graph();
    for (source, target, weight, _) in edges(graph) {
        assert!(weight > 0.0 && weight <= 1.0);

        let from_source = GraphBackend::neighbors(graph, &ProteinId::new(source.clone())).unwrap();
        let from_target = GraphBackend::neighbors(graph, &ProteinId::new(target.clone())).unwrap();
        let forward = from_source.iter().find(|n| n.node.id.as_str() == target).unwrap();
        let backward = from_target.iter().find(|n| n.node.id.as_str() == source).unwrap();
        assert_eq!(forward.weight, backward.weight);
        assert_eq!(forward.weight, weight);
    }
}

#[test]
fn test_upsert_and_recompute_idempotent() {
    let mut engine = GraphMaintainer::new(GraphStore::new());
    for (id, domains) in CORPUS {
        engine.add_protein(&record(id, domains)).unwrap();
    }
    let before = edges(engine.graph());

    for (id, domains) in CORPUS {
        let report = engine.add_protein(&record(id, domains)).unwrap();
        assert_eq!(report.created, report.removed);
    }
    assert_eq!(edges(engine.graph()), before);
    assert_eq!(GraphBackend::node_count(engine.graph()).unwrap(), CORPUS.len());
}

#[test]
fn test_update_relinks() {
    let mut engine = GraphMaintainer::new(GraphStore::new());
    engine.add_protein(&record("A", "IPR1")).unwrap();
    engine.add_protein(&record("B", "IPR1")).unwrap();
    engine.add_protein(&record("C", "IPR2")).unwrap();

    engine.add_protein(&record("A", "IPR2")).unwrap();
    let edges = edges(engine.graph());
    assert_eq!(edges.len(), 1);
    assert_eq!((edges[0].0.as_str(), edges[0].1.as_str()), ("A", "C"));
}

#[test]
fn test_delete_cascade_then_query_not_found() {
    let mut engine = GraphMaintainer::new(GraphStore::new());
    for (id, domains) in CORPUS {
        engine.add_protein(&record(id, domains)).unwrap();
    }
    let id = ProteinId::new("P03");
    let incident = GraphBackend::edges_of(engine.graph(), &id).unwrap().len();
    assert!(incident > 0);

    let report = engine.delete_protein(&id).unwrap();
    assert_eq!(report.nodes_removed, 1);
    assert_eq!(report.edges_removed, incident);
    assert!(edges(engine.graph())
        .iter()
        .all(|(s, t, _, _)| s != "P03" && t != "P03"));

    let query = NeighborhoodQuery::new(id.clone(), 10, 5);
    assert!(neighborhood(engine.graph(), &query).unwrap().is_none());

    let again = engine.delete_protein(&id).unwrap();
    assert!(again.is_empty());
}

#[test]
fn test_batch_build_matches_incremental() {
    let mut incremental = GraphMaintainer::new(GraphStore::new());
    for (id, domains) in CORPUS {
        incremental.add_protein(&record(id, domains)).unwrap();
    }

    let proteins: Vec<Protein> = CORPUS
        .iter()
        .map(|(id, domains)| normalize(&record(id, domains)).unwrap())
        .collect();
    let mut batch = GraphMaintainer::new(GraphStore::new());
    let report = batch.batch_build(&proteins, 2).unwrap();

    assert_eq!(report.nodes, CORPUS.len());
    assert_eq!(edges(batch.graph()), edges(incremental.graph()));
    assert_eq!(
        GraphBackend::node_count(batch.graph()).unwrap(),
        GraphBackend::node_count(incremental.graph()).unwrap()
    );
}

#[test]
fn test_neighborhood_over_corpus() {
    let mut engine = GraphMaintainer::new(GraphStore::new());
    for (id, domains) in CORPUS {
        engine.add_protein(&record(id, domains)).unwrap();
    }

    let query = NeighborhoodQuery::new(ProteinId::new("P01"), 10, 5);
    let subgraph = neighborhood(engine.graph(), &query).unwrap().unwrap();

    let center = subgraph.node(&ProteinId::new("P01")).unwrap();
    assert_eq!(center.similarity, 1.0);
    assert!(subgraph.node(&ProteinId::new("P07")).is_some());
    assert!(subgraph.node(&ProteinId::new("P04")).is_none());
    assert!(subgraph.node(&ProteinId::new("P05")).is_none());

    for edge in &subgraph.edges {
        assert!(subgraph.node(&edge.source).is_some());
        assert!(subgraph.node(&edge.target).is_some());
    }
}
