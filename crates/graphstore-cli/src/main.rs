//! Interactive REPL for the graphstore property graph engine.

use anyhow::Result;
use graphstore_cli::parser::{self, Command};
use graphstore_core::{EngineConfig, GraphEngine, ObjectRef};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const HELP_TEXT: &str = "\
commands:
  create graph: <name>
  create node: <Label> [key:value ...]
  create relationship: <Label> from <id> to <id> [key:value ...]
  match node: [id:<n>] [<Label>] [key<op>value]
  match relationship: [id:<n>] [<Label>] [key<op>value]
  delete node: id:<n>
  delete relationship: id:<n>
  update node: id:<n> [key:value ...]
  update relationship: id:<n> [key:value ...]
  help
  exit";

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| EngineConfig::default_config_path());
    let mut engine = GraphEngine::open(&config_path)?;

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("graphstore> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                if line.trim().is_empty() {
                    continue;
                }
                match parser::parse(&line) {
                    Ok(Command::Exit) => break,
                    Ok(command) => {
                        if let Err(e) = dispatch(&mut engine, command) {
                            println!("{e}");
                        }
                    }
                    Err(e) => println!("syntax error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("readline error: {e}");
                break;
            }
        }
    }

    engine.close()?;
    Ok(())
}

fn dispatch(engine: &mut GraphEngine, command: Command) -> Result<()> {
    match command {
        Command::Exit => {}
        Command::Help => println!("{HELP_TEXT}"),
        Command::CreateGraph { name } => {
            let graph = engine.create_graph(name)?;
            println!("created graph '{}'", graph.name);
        }
        Command::CreateNode { label, properties } => {
            let node = engine.create_node(&label, properties)?;
            println!("created node #{}", node.id);
        }
        Command::CreateRelationship { label, from, to, properties } => {
            let rel = engine.create_relationship(&label, from, to, properties)?;
            println!("created relationship #{}", rel.id);
        }
        Command::MatchNode { id, label, filter } => {
            let nodes = select_nodes(engine, id, label, filter)?;
            for node in nodes {
                println!("node #{} label_id={} properties={:?}", node.id, node.label_id, node.property_pairs());
            }
        }
        Command::MatchRelationship { id, label, filter } => {
            let rels = select_relationships(engine, id, label, filter)?;
            for rel in rels {
                println!(
                    "relationship #{} {} -> {} properties={:?}",
                    rel.id,
                    rel.from,
                    rel.to,
                    rel.property_pairs()
                );
            }
        }
        Command::DeleteNode { id } => {
            let node = engine.delete_node(id)?;
            println!("deleted node #{}", node.id);
        }
        Command::DeleteRelationship { id } => {
            let rel = engine.delete_relationship(id)?;
            println!("deleted relationship #{}", rel.id);
        }
        Command::UpdateNode { id, properties } => {
            let owner = owner_ref(true, id);
            for (key, value) in properties {
                engine.add_property(owner, key, value)?;
            }
            println!("updated node #{id}");
        }
        Command::UpdateRelationship { id, properties } => {
            let owner = owner_ref(false, id);
            for (key, value) in properties {
                engine.add_property(owner, key, value)?;
            }
            println!("updated relationship #{id}");
        }
    }
    Ok(())
}

fn select_nodes(
    engine: &mut GraphEngine,
    id: Option<i32>,
    label: Option<String>,
    filter: Option<(String, graphstore_core::Scalar, String)>,
) -> Result<Vec<graphstore_core::Node>> {
    if let Some(id) = id {
        return Ok(vec![engine.select_node(id)?]);
    }
    let scalar_filter = filter.as_ref().map(|(key, value, cmp)| {
        (graphstore_core::Scalar::String(key.clone()), value.clone(), cmp.as_str())
    });
    let filter_ref = scalar_filter.as_ref().map(|(k, v, c)| (k, v, *c));
    Ok(engine.select_nodes(label.as_deref(), filter_ref)?)
}

fn select_relationships(
    engine: &mut GraphEngine,
    id: Option<i32>,
    label: Option<String>,
    filter: Option<(String, graphstore_core::Scalar, String)>,
) -> Result<Vec<graphstore_core::Relationship>> {
    if let Some(id) = id {
        return Ok(vec![engine.select_relationship(id)?]);
    }
    let scalar_filter = filter.as_ref().map(|(key, value, cmp)| {
        (graphstore_core::Scalar::String(key.clone()), value.clone(), cmp.as_str())
    });
    let filter_ref = scalar_filter.as_ref().map(|(k, v, c)| (k, v, *c));
    Ok(engine.select_relationships(label.as_deref(), filter_ref)?)
}

fn owner_ref(is_node: bool, id: i32) -> ObjectRef {
    if is_node {
        ObjectRef::Node(id)
    } else {
        ObjectRef::Relationship(id)
    }
}
