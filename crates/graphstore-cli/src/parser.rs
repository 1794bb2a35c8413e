//! Tokenizer for the CLI's whitespace-separated command grammar.
//!
//! Grammar: first token is the verb (`create|match|delete|update`,
//! case-insensitive), second is an object-kind prefix (`graph:`, `node:`,
//! `relationship:`), further tokens carry a bare label, `id:<n>`, or
//! `key:value`; relationship creation adds `from <id> to <id>`; `match`
//! additionally accepts `key<op>value` with `op` scanned for inside one
//! token (no surrounding whitespace). `exit` and `help` are bare verbs.

use graphstore_core::Scalar;

/// One parsed command, ready to dispatch against a [`graphstore_core::GraphEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateGraph { name: String },
    CreateNode { label: String, properties: Vec<(Scalar, Scalar)> },
    CreateRelationship {
        label: String,
        from: i32,
        to: i32,
        properties: Vec<(Scalar, Scalar)>,
    },
    MatchNode { id: Option<i32>, label: Option<String>, filter: Option<(String, Scalar, String)> },
    MatchRelationship { id: Option<i32>, label: Option<String>, filter: Option<(String, Scalar, String)> },
    DeleteNode { id: i32 },
    DeleteRelationship { id: i32 },
    UpdateNode { id: i32, properties: Vec<(Scalar, Scalar)> },
    UpdateRelationship { id: i32, properties: Vec<(Scalar, Scalar)> },
    Exit,
    Help,
}

const COMPARATORS: [&str; 5] = ["<=", ">=", "=", "<", ">"];

fn split_comparator(token: &str) -> Option<(&str, &str, &str)> {
    for cmp in COMPARATORS {
        if let Some(pos) = token.find(cmp) {
            return Some((&token[..pos], cmp, &token[pos + cmp.len()..]));
        }
    }
    None
}

fn parse_scalar(text: &str) -> Scalar {
    if text == "True" {
        return Scalar::Bool(true);
    }
    if text == "False" {
        return Scalar::Bool(false);
    }
    if let Ok(i) = text.parse::<i64>() {
        return Scalar::Int(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        return Scalar::Float(f);
    }
    Scalar::String(text.to_string())
}

/// Tokenize and parse one line of CLI input into a [`Command`].
pub fn parse(line: &str) -> Result<Command, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((verb, rest)) = tokens.split_first() else {
        return Err("empty command".to_string());
    };
    let verb = verb.to_lowercase();

    match verb.as_str() {
        "exit" => return Ok(Command::Exit),
        "help" => return Ok(Command::Help),
        _ => {}
    }

    let Some((kind, rest)) = rest.split_first() else {
        return Err(format!("missing object kind after '{verb}'"));
    };

    match verb.as_str() {
        "create" => parse_create(kind, rest),
        "match" => parse_match(kind, rest),
        "delete" => parse_delete(kind, rest),
        "update" => parse_update(kind, rest),
        other => Err(format!("unknown verb '{other}'")),
    }
}

fn parse_create(kind: &str, rest: &[&str]) -> Result<Command, String> {
    match *kind {
        "graph:" => {
            let name = rest.first().ok_or("create graph: requires a name")?;
            Ok(Command::CreateGraph { name: name.to_string() })
        }
        "node:" => {
            let (label, properties) = parse_label_and_properties(rest)?;
            Ok(Command::CreateNode { label, properties })
        }
        "relationship:" => parse_create_relationship(rest),
        other => Err(format!("unknown object kind '{other}'")),
    }
}

fn parse_create_relationship(rest: &[&str]) -> Result<Command, String> {
    let (label, tail) = rest.split_first().ok_or("create relationship: requires a label")?;
    let from_idx = tail.iter().position(|t| *t == "from").ok_or("create relationship: missing 'from'")?;
    let to_idx = tail.iter().position(|t| *t == "to").ok_or("create relationship: missing 'to'")?;
    let from_id: i32 = tail
        .get(from_idx + 1)
        .ok_or("create relationship: missing id after 'from'")?
        .parse()
        .map_err(|_| "create relationship: 'from' id must be an integer".to_string())?;
    let to_id: i32 = tail
        .get(to_idx + 1)
        .ok_or("create relationship: missing id after 'to'")?
        .parse()
        .map_err(|_| "create relationship: 'to' id must be an integer".to_string())?;

    let mut property_tokens = Vec::new();
    for (i, token) in tail.iter().enumerate() {
        if i == from_idx || i == from_idx + 1 || i == to_idx || i == to_idx + 1 {
            continue;
        }
        property_tokens.push(*token);
    }
    let properties = parse_properties(&property_tokens)?;

    Ok(Command::CreateRelationship {
        label: label.to_string(),
        from: from_id,
        to: to_id,
        properties,
    })
}

fn parse_label_and_properties(rest: &[&str]) -> Result<(String, Vec<(Scalar, Scalar)>), String> {
    let (label, tail) = rest.split_first().ok_or("missing label")?;
    let properties = parse_properties(tail)?;
    Ok((label.to_string(), properties))
}

fn parse_properties(tokens: &[&str]) -> Result<Vec<(Scalar, Scalar)>, String> {
    tokens
        .iter()
        .map(|token| {
            let (key, value) = token
                .split_once(':')
                .ok_or_else(|| format!("malformed key:value token '{token}'"))?;
            Ok((Scalar::String(key.to_string()), parse_scalar(value)))
        })
        .collect()
}

fn parse_match(kind: &str, rest: &[&str]) -> Result<Command, String> {
    let is_node = match kind {
        "node:" => true,
        "relationship:" => false,
        other => return Err(format!("unknown object kind '{other}'")),
    };

    let mut id = None;
    let mut label = None;
    let mut filter = None;

    for token in rest {
        if let Some(rest_id) = token.strip_prefix("id:") {
            id = Some(
                rest_id
                    .parse::<i32>()
                    .map_err(|_| format!("malformed id token '{token}'"))?,
            );
        } else if let Some((key, cmp, value)) = split_comparator(token) {
            filter = Some((key.to_string(), parse_scalar(value), cmp.to_string()));
        } else {
            label = Some(token.to_string());
        }
    }

    if is_node {
        Ok(Command::MatchNode { id, label, filter })
    } else {
        Ok(Command::MatchRelationship { id, label, filter })
    }
}

fn parse_update(kind: &str, rest: &[&str]) -> Result<Command, String> {
    let id_token = rest.first().ok_or("update: missing id:<n> token")?;
    let id_text = id_token.strip_prefix("id:").ok_or("update: expected 'id:<n>'")?;
    let id: i32 = id_text.parse().map_err(|_| format!("malformed id token '{id_token}'"))?;
    let properties = parse_properties(&rest[1..])?;

    match kind {
        "node:" => Ok(Command::UpdateNode { id, properties }),
        "relationship:" => Ok(Command::UpdateRelationship { id, properties }),
        other => Err(format!("unknown object kind '{other}'")),
    }
}

fn parse_delete(kind: &str, rest: &[&str]) -> Result<Command, String> {
    let id_token = rest.first().ok_or("delete: missing id:<n> token")?;
    let id_text = id_token.strip_prefix("id:").ok_or("delete: expected 'id:<n>'")?;
    let id: i32 = id_text.parse().map_err(|_| format!("malformed id token '{id_token}'"))?;

    match kind {
        "node:" => Ok(Command::DeleteNode { id }),
        "relationship:" => Ok(Command::DeleteRelationship { id }),
        other => Err(format!("unknown object kind '{other}'")),
    }
}
