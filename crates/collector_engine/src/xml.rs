use std::fmt::Display;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::DecodeError;

/// Convert an XML document into a JSON value tree: elements become
/// objects, repeated siblings become arrays, attributes keep an `@`
/// prefix, and text-only elements collapse to strings. Namespace
/// prefixes are stripped from element and attribute names, which also
/// covers SOAP envelopes.
pub fn xml_to_value(text: &str) -> Result<Value, DecodeError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    struct Node {
        name: String,
        map: Map<String, Value>,
        text: String,
    }

    // Synthetic root so the document element inserts like any child.
    let mut stack = vec![Node {
        name: String::new(),
        map: Map::new(),
        text: String::new(),
    }];

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let mut node = Node {
                    name: local_name(start.name().as_ref()),
                    map: Map::new(),
                    text: String::new(),
                };
                for attr in start.attributes() {
                    let attr = attr.map_err(malformed)?;
                    let key = format!("@{}", local_name(attr.key.as_ref()));
                    let value = attr.unescape_value().map_err(malformed)?.into_owned();
                    node.map.insert(key, Value::String(value));
                }
                stack.push(node);
            }
            Ok(Event::Empty(empty)) => {
                let name = local_name(empty.name().as_ref());
                let mut map = Map::new();
                for attr in empty.attributes() {
                    let attr = attr.map_err(malformed)?;
                    let key = format!("@{}", local_name(attr.key.as_ref()));
                    let value = attr.unescape_value().map_err(malformed)?.into_owned();
                    map.insert(key, Value::String(value));
                }
                let value = if map.is_empty() {
                    Value::Null
                } else {
                    Value::Object(map)
                };
                let Some(parent) = stack.last_mut() else {
                    return Err(malformed("unbalanced document"));
                };
                insert_child(&mut parent.map, name, value);
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(malformed)?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                let bytes = c.into_inner();
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(malformed("unbalanced document"));
                }
                let Some(node) = stack.pop() else {
                    return Err(malformed("unbalanced document"));
                };
                let value = node_value(node.map, node.text);
                let Some(parent) = stack.last_mut() else {
                    return Err(malformed("unbalanced document"));
                };
                insert_child(&mut parent.map, node.name, value);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(malformed(err)),
        }
    }

    match stack.pop() {
        Some(root) if stack.is_empty() => Ok(Value::Object(root.map)),
        _ => Err(malformed("unbalanced document")),
    }
}

fn node_value(map: Map<String, Value>, text: String) -> Value {
    if map.is_empty() {
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text)
        }
    } else {
        let mut map = map;
        if !text.is_empty() {
            map.insert("#text".to_string(), Value::String(text));
        }
        Value::Object(map)
    }
}

/// Repeated siblings fold into an array, first occurrence first.
fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.remove(&name) {
        None => {
            map.insert(name, value);
        }
        Some(Value::Array(mut items)) => {
            items.push(value);
            map.insert(name, Value::Array(items));
        }
        Some(existing) => {
            map.insert(name, Value::Array(vec![existing, value]));
        }
    }
}

fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit(':').next() {
        Some(last) => last.to_string(),
        None => name.into_owned(),
    }
}

fn malformed<E: Display>(err: E) -> DecodeError {
    DecodeError::Malformed {
        format: "xml",
        message: err.to_string(),
    }
}
