use tag_graph::graph::DEFAULT_EDGE_TYPE;
use tag_graph::query::ast::{Command, DeleteTarget, Direction, NodeFilter, SearchSpec};
use tag_graph::{CommandParser, GraphEngine, ParseError, PestCommandParser, StatusCode};

#[test]
fn test_parser_behind_trait_object() {
    let parser: Box<dyn CommandParser> = Box::new(PestCommandParser);
    let commands = parser
        .parse(
            "// seed data\n\
             ADD NODE key=node1 set t1,t2=v2;\n\
             Add Edge from=node1 to=node2;\n\
             select (key=node1) -> [*] -> (*)",
        )
        .unwrap();
    assert_eq!(commands.len(), 3);

    match &commands[1] {
        Command::AddEdge(edge) => assert_eq!(edge.edge_type.as_str(), DEFAULT_EDGE_TYPE),
        other => panic!("expected AddEdge, got {:?}", other),
    }

    match &commands[2] {
        Command::Select(select) => {
            let steps = &select.chain.steps;
            assert_eq!(steps.len(), 3);
            assert_eq!(
                steps[0].spec,
                SearchSpec::Node(vec![NodeFilter::Key("node1".to_string())])
            );
            assert_eq!(steps[1].join, Some(Direction::Forward));
            assert_eq!(steps[2].spec, SearchSpec::all_nodes());
        }
        other => panic!("expected Select, got {:?}", other),
    }
}

#[test]
fn test_keyed_and_search_deletes() {
    let parser = PestCommandParser;
    let commands = parser
        .parse("delete node key=a ifexist; delete edge from=a to=b type=t; delete (x) <- [*];")
        .unwrap();

    match &commands[0] {
        Command::DeleteNode(delete) => {
            assert!(delete.if_exist);
            assert_eq!(delete.target, DeleteTarget::Key("a".to_string()));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        &commands[1],
        Command::DeleteEdge(d) if matches!(d.target, DeleteTarget::Key(_))
    ));
    assert!(matches!(
        &commands[2],
        Command::DeleteEdge(d) if matches!(d.target, DeleteTarget::Search(_))
    ));
}

#[test]
fn test_syntax_error_is_pest_error() {
    let err = PestCommandParser.parse("select (key=a").unwrap_err();
    assert!(matches!(err, ParseError::PestError(_)));
}

#[tokio::test]
async fn test_engine_rejects_bad_script_without_running_it() {
    let engine = GraphEngine::new();
    let batch = engine.execute("add node key=a; frobnicate;").await;
    assert_eq!(batch.status, StatusCode::BadRequest);
    assert!(batch.items.is_empty());
    assert!(engine.snapshot().await.nodes.is_empty());
}
