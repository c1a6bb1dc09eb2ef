//! Lazy `$ref` resolution over a parsed document.
//!
//! Resolution is explicit: callers walk the document through [`NodeView`]s
//! and every child access dereferences at most the `$ref` it lands on. Each
//! view carries the trail of refs opened on the path that produced it, so a
//! cycle is detected per branch and surfaces as [`Resolved::Cycle`] rather
//! than recursing. Sibling subtrees share their parent's trail, never each
//! other's.

use indexmap::IndexSet;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

/// Refs opened along one resolution path, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefTrail<'a>(Vec<&'a str>);

impl<'a> RefTrail<'a> {
    pub fn contains(&self, ref_path: &str) -> bool {
        self.0.iter().any(|r| *r == ref_path)
    }

    fn with(&self, ref_path: &'a str) -> Self {
        let mut refs = self.0.clone();
        refs.push(ref_path);
        RefTrail(refs)
    }

    pub fn refs(&self) -> &[&'a str] {
        &self.0
    }
}

/// Outcome of reading a node that may be a `$ref`.
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    /// A plain node, or the target of a successfully resolved ref.
    Node(NodeView<'a>),
    /// The ref is already open on this branch; the raw marker is returned.
    Cycle(&'a str),
    /// The ref points nowhere in the document.
    Dangling(&'a str),
}

impl<'a> Resolved<'a> {
    pub fn node(self) -> Option<NodeView<'a>> {
        match self {
            Resolved::Node(view) => Some(view),
            Resolved::Cycle(_) | Resolved::Dangling(_) => None,
        }
    }

    /// Owned JSON for this outcome; unresolved refs stay as `{"$ref": ...}`.
    pub fn materialize(&self, depth: usize) -> Value {
        match self {
            Resolved::Node(view) => view.materialize(depth),
            Resolved::Cycle(r) | Resolved::Dangling(r) => ref_marker(r),
        }
    }
}

/// Resolves local JSON-pointer refs (`#/a/b/c`) against a root document.
#[derive(Debug, Clone, Copy)]
pub struct RefResolver<'a> {
    root: &'a Value,
}

impl<'a> RefResolver<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// View over the document root.
    pub fn root_view(&self) -> NodeView<'a> {
        self.view(self.root)
    }

    /// View over an arbitrary node with an empty trail. The node itself is
    /// not dereferenced; use [`RefResolver::resolve`] for that.
    pub fn view(&self, node: &'a Value) -> NodeView<'a> {
        NodeView {
            resolver: *self,
            value: node,
            trail: RefTrail::default(),
            origin: None,
        }
    }

    /// Resolve `node` itself, following it when it is a `$ref` object.
    pub fn resolve(&self, node: &'a Value) -> Resolved<'a> {
        self.resolve_with_trail(node, &RefTrail::default())
    }

    fn resolve_with_trail(&self, node: &'a Value, trail: &RefTrail<'a>) -> Resolved<'a> {
        match ref_of(node) {
            Some(ref_path) => self.resolve_ref(ref_path, trail),
            None => Resolved::Node(NodeView {
                resolver: *self,
                value: node,
                trail: trail.clone(),
                origin: None,
            }),
        }
    }

    /// Dereference one `$ref` relative to an open trail. A target that is
    /// itself a `$ref` is followed, each hop extending the trail.
    pub fn resolve_ref(&self, ref_path: &'a str, trail: &RefTrail<'a>) -> Resolved<'a> {
        let mut current = ref_path;
        let mut trail = trail.clone();
        loop {
            if trail.contains(current) {
                return Resolved::Cycle(current);
            }
            let Some(target) = self.lookup(current) else {
                log::debug!("unresolvable reference {current}");
                return Resolved::Dangling(current);
            };
            trail = trail.with(current);
            match ref_of(target) {
                Some(next) => current = next,
                None => {
                    return Resolved::Node(NodeView {
                        resolver: *self,
                        value: target,
                        trail,
                        origin: Some(ref_path),
                    });
                }
            }
        }
    }

    /// Look up a local ref. Non-local refs and missing paths yield `None`.
    pub fn lookup(&self, ref_path: &str) -> Option<&'a Value> {
        let pointer = ref_path.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(self.root);
        }
        self.root.pointer(&percent_decode_str(pointer).decode_utf8_lossy())
    }

    /// Every `$ref` reachable from `node`, following resolved targets,
    /// deduplicated in discovery order. Each ref is visited once, so cyclic
    /// documents terminate.
    pub fn collect_refs(&self, node: &'a Value) -> Vec<&'a str> {
        let mut seen = IndexSet::new();
        self.walk_refs(node, &mut seen);
        seen.into_iter().collect()
    }

    fn walk_refs(&self, node: &'a Value, seen: &mut IndexSet<&'a str>) {
        match node {
            Value::Object(map) => {
                if let Some(ref_path) = map.get("$ref").and_then(Value::as_str)
                    && seen.insert(ref_path)
                    && let Some(target) = self.lookup(ref_path)
                {
                    self.walk_refs(target, seen);
                }
                for (key, child) in map {
                    if key != "$ref" {
                        self.walk_refs(child, seen);
                    }
                }
            }
            Value::Array(items) => {
                for child in items {
                    self.walk_refs(child, seen);
                }
            }
            _ => {}
        }
    }
}

/// A node inside the document, read through the resolver.
#[derive(Debug, Clone)]
pub struct NodeView<'a> {
    resolver: RefResolver<'a>,
    value: &'a Value,
    trail: RefTrail<'a>,
    origin: Option<&'a str>,
}

impl<'a> NodeView<'a> {
    /// The raw node; its children are not dereferenced.
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// The `$ref` this node was reached through, if any.
    pub fn origin_ref(&self) -> Option<&'a str> {
        self.origin
    }

    pub fn trail(&self) -> &RefTrail<'a> {
        &self.trail
    }

    pub fn resolver(&self) -> RefResolver<'a> {
        self.resolver
    }

    /// Read an object member, dereferencing it when it is a `$ref`.
    pub fn get(&self, key: &str) -> Option<Resolved<'a>> {
        let child = self.value.get(key)?;
        Some(self.resolver.resolve_with_trail(child, &self.trail))
    }

    /// Read an array element, dereferencing it when it is a `$ref`.
    pub fn index(&self, index: usize) -> Option<Resolved<'a>> {
        let child = self.value.get(index)?;
        Some(self.resolver.resolve_with_trail(child, &self.trail))
    }

    /// Convenience for `get` that keeps only successfully resolved nodes.
    pub fn node(&self, key: &str) -> Option<NodeView<'a>> {
        self.get(key).and_then(Resolved::node)
    }

    /// String member, after resolution.
    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.node(key).and_then(|n| n.value.as_str())
    }

    /// Object members in document order, each resolved.
    pub fn entries(&self) -> Vec<(&'a str, Resolved<'a>)> {
        match self.value {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (k.as_str(), self.resolver.resolve_with_trail(v, &self.trail)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Array elements in order, each resolved.
    pub fn elements(&self) -> Vec<Resolved<'a>> {
        match self.value {
            Value::Array(items) => items
                .iter()
                .map(|v| self.resolver.resolve_with_trail(v, &self.trail))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Owned copy of this subtree. Refs inside it are inlined while they lie
    /// within `depth` ref hops of this node, and inlined objects keep their
    /// originating `$ref`. Deeper refs, cycles and dangling refs stay as
    /// `{"$ref": ...}` markers.
    pub fn materialize(&self, depth: usize) -> Value {
        let mut value = match self.value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, _)| key.as_str() != "$ref")
                    .map(|(key, child)| (key.clone(), self.materialize_child(child, depth)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|child| self.materialize_child(child, depth))
                    .collect(),
            ),
            scalar => scalar.clone(),
        };
        if let (Some(origin), Value::Object(map)) = (self.origin, &mut value) {
            map.insert("$ref".to_string(), Value::String(origin.to_string()));
        }
        value
    }

    fn materialize_child(&self, child: &'a Value, depth: usize) -> Value {
        match ref_of(child) {
            Some(ref_path) if depth == 0 => ref_marker(ref_path),
            Some(_) => self
                .resolver
                .resolve_with_trail(child, &self.trail)
                .materialize(depth - 1),
            None => NodeView {
                resolver: self.resolver,
                value: child,
                trail: self.trail.clone(),
                origin: None,
            }
            .materialize(depth),
        }
    }
}

fn ref_of(node: &Value) -> Option<&str> {
    node.as_object()?.get("$ref")?.as_str()
}

fn ref_marker(ref_path: &str) -> Value {
    let mut map = Map::new();
    map.insert("$ref".to_string(), Value::String(ref_path.to_string()));
    Value::Object(map)
}
