// Field path patterns and their expansion against a data tree

use crate::RuleSpecError;
use serde_json::{Map, Value};
use std::fmt;

/// One step of a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A pattern resolved to one location in the data tree.
///
/// `value` is `None` when nothing exists at the location, which is
/// different from a JSON `null` being present.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcreteField<'a> {
    pub segments: Vec<PathSegment>,
    pub value: Option<&'a Value>,
}

impl ConcreteField<'_> {
    /// Dotted form, e.g. `address.0.city`.
    pub fn path(&self) -> String {
        join(&self.segments)
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

fn join(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Literal(String),
    Wildcard,
}

/// A dotted field pattern such as `name.first` or `address.*.city`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPattern {
    raw: String,
    segments: Vec<PatternSegment>,
}

impl FieldPattern {
    pub fn parse(raw: &str) -> Result<Self, RuleSpecError> {
        let invalid = |reason: &str| RuleSpecError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let segments = raw
            .split('.')
            .map(|segment| match segment {
                "" => Err(invalid("pattern contains an empty segment")),
                "*" => Ok(PatternSegment::Wildcard),
                key => Ok(PatternSegment::Literal(key.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&PatternSegment::Wildcard)
    }

    /// Resolve the pattern against `data`, depth first in index order.
    ///
    /// A `*` over a missing or non-sequence node yields nothing. A missing
    /// literal key yields a single absent field.
    pub fn expand<'a>(&self, data: &'a Value) -> Vec<ConcreteField<'a>> {
        let mut out = Vec::new();
        let mut prefix = Vec::with_capacity(self.segments.len());
        walk(Some(data), &self.segments, &mut prefix, &mut out);
        out
    }
}

impl fmt::Display for FieldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn walk<'a>(
    node: Option<&'a Value>,
    remaining: &[PatternSegment],
    prefix: &mut Vec<PathSegment>,
    out: &mut Vec<ConcreteField<'a>>,
) {
    match remaining.split_first() {
        None => out.push(ConcreteField {
            segments: prefix.clone(),
            value: node,
        }),
        Some((PatternSegment::Literal(key), rest)) => {
            let (segment, child) = descend(node, key);
            prefix.push(segment);
            walk(child, rest, prefix, out);
            prefix.pop();
        }
        Some((PatternSegment::Wildcard, rest)) => {
            if let Some(Value::Array(items)) = node {
                for (index, item) in items.iter().enumerate() {
                    prefix.push(PathSegment::Index(index));
                    walk(Some(item), rest, prefix, out);
                    prefix.pop();
                }
            }
        }
    }
}

fn descend<'a>(node: Option<&'a Value>, key: &str) -> (PathSegment, Option<&'a Value>) {
    match node {
        Some(Value::Object(map)) => (PathSegment::Key(key.to_string()), map.get(key)),
        Some(Value::Array(items)) => match key.parse::<usize>() {
            Ok(index) => (PathSegment::Index(index), items.get(index)),
            Err(_) => (PathSegment::Key(key.to_string()), None),
        },
        _ => (PathSegment::Key(key.to_string()), None),
    }
}

/// Expand `pattern` against `data`.
///
/// ```
/// use serde_json::json;
/// use verdict_validation::expand;
///
/// let data = json!({"address": [{"city": "Jakarta"}, {"city": "Bandung"}]});
/// let fields = expand("address.*.city", &data).unwrap();
/// let paths: Vec<_> = fields.iter().map(|f| f.path()).collect();
/// assert_eq!(paths, ["address.0.city", "address.1.city"]);
/// ```
pub fn expand<'a>(pattern: &str, data: &'a Value) -> Result<Vec<ConcreteField<'a>>, RuleSpecError> {
    Ok(FieldPattern::parse(pattern)?.expand(data))
}

/// Resolve a literal dotted path. Wildcards never match here.
pub fn lookup<'a>(path: &str, data: &'a Value) -> Option<&'a Value> {
    path.split('.')
        .try_fold(data, |node, key| descend(Some(node), key).1)
}

/// Write `value` at `segments`, creating mappings and sequences on the way.
pub(crate) fn insert(tree: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *tree = value;
        return;
    };

    match head {
        PathSegment::Key(key) => {
            if !tree.is_object() {
                *tree = Value::Object(Map::new());
            }
            if let Value::Object(map) = tree {
                insert(map.entry(key.clone()).or_insert(Value::Null), rest, value);
            }
        }
        PathSegment::Index(index) => {
            if !tree.is_array() {
                *tree = Value::Array(Vec::new());
            }
            if let Value::Array(items) = tree {
                if *index >= items.len() {
                    items.resize(index + 1, Value::Null);
                }
                insert(&mut items[*index], rest, value);
            }
        }
    }
}
