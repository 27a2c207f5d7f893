use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tag_graph::config::EngineConfig;
use tag_graph::graph::{Edge, GraphMap, Node, Tags};
use tag_graph::metrics::GraphMetrics;
use tag_graph::query::executor::{MutQueryExecutor, QueryExecutor};
use tag_graph::query::parse_script;

fn populated(size: usize) -> GraphMap {
    let mut graph = GraphMap::new();
    for i in 0..size {
        let tags = Tags::parse(&format!("name=user{},group=g{}", i, i % 10));
        let mut node = Node::new_with_tags(format!("user{}", i), tags);
        node.indexes.insert("name".into());
        graph.put_node(node).unwrap();
    }
    for i in 1..size {
        graph.put_edge(Edge::new(format!("user{}", i - 1), format!("user{}", i), "next"));
    }
    graph
}

/// Node insertion through the write executor
fn bench_node_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_insertion");
    let config = EngineConfig::default();

    for size in [100, 1000, 10_000].iter() {
        let script: String = (0..*size)
            .map(|i| format!("add node key=n{} set name=n{},active index name;", i, i))
            .collect();
        let commands = parse_script(&script).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut graph = GraphMap::new();
                let mut executor = MutQueryExecutor::new(&mut graph, &config);
                for command in &commands {
                    executor.execute(command).unwrap();
                }
            });
        });
    }
    group.finish();
}

/// Unique probe vs tag bucket vs glob scan
fn bench_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookups");
    let graph = populated(10_000);
    let metrics = GraphMetrics::new();

    for (name, script) in [
        ("key", "select (key=user5000);"),
        ("unique", "select (name=user5000);"),
        ("tag", "select (group=g3);"),
        ("glob_scan", "select (key=user50*);"),
    ] {
        let commands = parse_script(script).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                QueryExecutor::new(&graph, &metrics)
                    .execute(&commands[0])
                    .unwrap()
            });
        });
    }
    group.finish();
}

/// Chained traversal over a path graph
fn bench_traversal(c: &mut Criterion) {
    let graph = populated(1000);
    let metrics = GraphMetrics::new();
    let commands =
        parse_script("select (group=g1) -> [type=next] -> (*) -> [type=next] -> (*);").unwrap();

    c.bench_function("two_hop_traversal", |b| {
        b.iter(|| {
            QueryExecutor::new(&graph, &metrics)
                .execute(&commands[0])
                .unwrap()
        });
    });
}

/// Cost of forking the published state for a batch
fn bench_fork(c: &mut Criterion) {
    let mut group = c.benchmark_group("fork");
    for size in [1000, 10_000].iter() {
        let graph = populated(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| graph.fork());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_node_insertion,
    bench_lookups,
    bench_traversal,
    bench_fork
);
criterion_main!(benches);
