//! URL-encoded form decoding

use crate::Error;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Parse URL-encoded form data into a typed value.
pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))
}

/// Parse URL-encoded form data into a flat map. Later duplicates win.
pub fn parse_form_map(body: &[u8]) -> Result<HashMap<String, String>, Error> {
    let pairs: Vec<(String, String)> = parse_form(body)?;
    Ok(pairs.into_iter().collect())
}

/// Parse URL-encoded form data into a nested tree.
///
/// Bracket notation builds structure: `name[first]=A` creates a mapping,
/// `address[0][city]=B` and `tags[]=x` create sequences. Every leaf is a
/// string. A sequence only grows by one slot at a time: an index past its
/// end turns the sequence into a mapping keyed by index.
///
/// ```
/// use verdict_core::parse_form_tree;
///
/// let tree = parse_form_tree(b"name[first]=Rahmat&address[0][city]=Jakarta&tags[]=a&tags[]=b").unwrap();
/// assert_eq!(tree["name"]["first"], "Rahmat");
/// assert_eq!(tree["address"][0]["city"], "Jakarta");
/// assert_eq!(tree["tags"][1], "b");
/// ```
pub fn parse_form_tree(body: &[u8]) -> Result<Value, Error> {
    let pairs: Vec<(String, String)> = parse_form(body)?;
    let mut root = Value::Object(Map::new());

    for (key, value) in pairs {
        let segments = split_key(&key);
        if segments.first().is_none_or(|head| head.is_empty()) {
            continue;
        }
        insert(&mut root, &segments, Value::String(value));
    }

    Ok(root)
}

/// `a[b][0][]` becomes `["a", "b", "0", ""]`. An unterminated bracket
/// leaves the remainder as part of the last segment.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];

    while let Some(inner) = rest.strip_prefix('[') {
        match inner.find(']') {
            Some(close) => {
                segments.push(inner[..close].to_string());
                rest = &inner[close + 1..];
            }
            None => break,
        }
    }

    if !rest.is_empty() {
        if let Some(last) = segments.last_mut() {
            last.push_str(rest);
        }
    }

    segments
}

/// Slot `segment` addresses in a sequence of `len` items, if it is an
/// append (`[]`, `[len]`) or an overwrite.
fn slot(segment: &str, len: usize) -> Option<usize> {
    if segment.is_empty() {
        return Some(len);
    }
    segment.parse::<usize>().ok().filter(|index| *index <= len)
}

fn insert(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_array() && !node.is_object() {
        *node = if slot(head, 0).is_some() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }

    // a named or out-of-range key under a sequence turns it into a mapping keyed by index
    let fits = match node {
        Value::Array(items) => slot(head, items.len()).is_some(),
        _ => true,
    };
    if !fits {
        if let Value::Array(items) = std::mem::take(node) {
            *node = Value::Object(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), item))
                    .collect(),
            );
        }
    }

    match node {
        Value::Array(items) => {
            let index = slot(head, items.len()).unwrap_or(items.len());
            if index == items.len() {
                items.push(Value::Null);
            }
            insert(&mut items[index], rest, value);
        }
        Value::Object(map) => {
            let key = if head.is_empty() {
                map.len().to_string()
            } else {
                head.clone()
            };
            insert(map.entry(key).or_insert(Value::Null), rest, value);
        }
        _ => unreachable!("node was normalised to a container"),
    }
}
