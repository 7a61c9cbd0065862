// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency-ordered resolution of font declarations.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::{FontCollection, RawFontBundle, RawProvider};

#[derive(Copy, Clone, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// Resolves a set of declaration bundles into one flattened collection per
/// font name.
///
/// Nodes are processed in dependency order: a node is flattened only after
/// every name it references. References are substituted with the referenced
/// name's already-resolved family list, order-preserving and deduplicated.
/// Cyclic references never recurse: when a dependency is still in progress
/// (or absent) at substitution time it is treated as missing, logged, and
/// contributes nothing. Names that flatten to no families are skipped with
/// a warning rather than published empty.
///
/// When the input contains several bundles for the same name, the later one
/// replaces the earlier — precedence between declaration sources is the
/// caller's population order.
pub fn resolve(bundles: Vec<RawFontBundle>) -> HashMap<Arc<str>, FontCollection> {
    // Insertion-ordered node list; later duplicates replace in place so
    // resolution order stays deterministic.
    let mut nodes: Vec<RawFontBundle> = Vec::with_capacity(bundles.len());
    let mut index: HashMap<Arc<str>, usize> = HashMap::with_capacity(bundles.len());
    for bundle in bundles {
        match index.get(&bundle.name) {
            Some(&at) => {
                debug!(font = %bundle.name, "later declaration replaces an earlier one");
                nodes[at] = bundle;
            }
            None => {
                index.insert(bundle.name.clone(), nodes.len());
                nodes.push(bundle);
            }
        }
    }

    let mut state = vec![VisitState::Unvisited; nodes.len()];
    let mut resolved: HashMap<Arc<str>, FontCollection> = HashMap::with_capacity(nodes.len());

    // Iterative depth-first visit; an explicit stack keeps arbitrarily deep
    // reference chains off the call stack.
    enum Frame {
        Enter(usize),
        Flatten(usize),
    }
    let mut stack = Vec::new();
    for root in 0..nodes.len() {
        if state[root] != VisitState::Unvisited {
            continue;
        }
        stack.push(Frame::Enter(root));
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(at) => {
                    if state[at] != VisitState::Unvisited {
                        continue;
                    }
                    state[at] = VisitState::InProgress;
                    stack.push(Frame::Flatten(at));
                    for dependency in nodes[at].dependencies.iter().rev() {
                        if let Some(&dep) = index.get(dependency) {
                            if state[dep] == VisitState::Unvisited {
                                stack.push(Frame::Enter(dep));
                            }
                        }
                    }
                }
                Frame::Flatten(at) => {
                    flatten(&nodes[at], &resolved).map_or_else(
                        || {
                            warn!(font = %nodes[at].name, "font resolved to no families, skipping");
                        },
                        |collection| {
                            resolved.insert(nodes[at].name.clone(), collection);
                        },
                    );
                    state[at] = VisitState::Done;
                }
            }
        }
    }
    resolved
}

/// Flattens one node's provider list against the already-resolved map.
/// Returns `None` when the result would be empty.
fn flatten(
    node: &RawFontBundle,
    resolved: &HashMap<Arc<str>, FontCollection>,
) -> Option<FontCollection> {
    let mut seen = HashSet::new();
    let mut families = Vec::new();
    for provider in &node.providers {
        match provider {
            RawProvider::Family(family) => {
                if seen.insert(family.key()) {
                    families.push(family.clone());
                }
            }
            RawProvider::Reference(name) => match resolved.get(name) {
                Some(collection) => {
                    for family in collection.iter() {
                        if seen.insert(family.key()) {
                            families.push(family.clone());
                        }
                    }
                }
                None => {
                    warn!(font = %node.name, reference = %name, "unresolved font reference");
                }
            },
        }
    }
    if families.is_empty() {
        None
    } else {
        Some(FontCollection::from_families(families))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FontFamily, SpaceFont};

    fn family(name: &str) -> Arc<FontFamily> {
        Arc::new(FontFamily::Space(SpaceFont::new(name, [(' ', 4.0)])))
    }

    fn bundle(name: &str, providers: Vec<RawProvider>) -> RawFontBundle {
        let dependencies = providers
            .iter()
            .filter_map(|p| match p {
                RawProvider::Reference(id) => Some(id.clone()),
                RawProvider::Family(_) => None,
            })
            .collect();
        RawFontBundle {
            name: name.into(),
            providers,
            dependencies,
        }
    }

    fn reference(name: &str) -> RawProvider {
        RawProvider::Reference(name.into())
    }

    #[test]
    fn reference_chain_flattens_transitively() {
        // A references B references C; C's family must surface in A.
        let c = family("c_face");
        let run = || {
            resolve(vec![
                bundle("a", vec![reference("b")]),
                bundle("b", vec![reference("c")]),
                bundle("c", vec![RawProvider::Family(c.clone())]),
            ])
        };
        let first = run();
        let a = first.get("a").unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a.families()[0].family_name(), "c_face");

        // Determinism: same input, same flattened ordering.
        let second = run();
        let names = |m: &HashMap<Arc<str>, FontCollection>, k: &str| {
            m.get(k)
                .unwrap()
                .iter()
                .map(|f| f.family_name().to_owned())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&first, "a"), names(&second, "a"));
        assert_eq!(names(&first, "b"), names(&second, "b"));
    }

    #[test]
    fn reference_order_and_dedup_are_preserved() {
        let x = family("x");
        let y = family("y");
        let resolved = resolve(vec![
            bundle(
                "base",
                vec![RawProvider::Family(x.clone()), RawProvider::Family(y.clone())],
            ),
            bundle(
                "ui",
                // x appears both directly and through the reference; it must
                // keep its first position and not repeat.
                vec![RawProvider::Family(x.clone()), reference("base")],
            ),
        ]);
        let ui: Vec<_> = resolved
            .get("ui")
            .unwrap()
            .iter()
            .map(|f| f.family_name())
            .collect();
        assert_eq!(ui, vec!["x", "y"]);
    }

    #[test]
    fn cycle_is_broken_without_recursion() {
        let a_face = family("a_face");
        let resolved = resolve(vec![
            bundle(
                "a",
                vec![RawProvider::Family(a_face.clone()), reference("b")],
            ),
            bundle("b", vec![reference("a")]),
        ]);
        // The depth-first visit flattens "b" first; it sees "a" still in
        // progress, treats it as missing, ends up empty and is skipped.
        // "a" then resolves to its own family. No deadlock, no recursion.
        let a = resolved.get("a").unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a.families()[0].family_name(), "a_face");
        assert!(!resolved.contains_key("b"));
    }

    #[test]
    fn self_reference_contributes_nothing() {
        let face = family("face");
        let resolved = resolve(vec![bundle(
            "a",
            vec![reference("a"), RawProvider::Family(face)],
        )]);
        assert_eq!(resolved.get("a").unwrap().len(), 1);
    }

    #[test]
    fn empty_result_is_skipped() {
        let resolved = resolve(vec![bundle("ghost", vec![reference("nowhere")])]);
        assert!(!resolved.contains_key("ghost"));
    }

    #[test]
    fn later_declaration_takes_precedence() {
        let early = family("early");
        let late = family("late");
        let resolved = resolve(vec![
            bundle("default", vec![RawProvider::Family(early)]),
            bundle("default", vec![RawProvider::Family(late)]),
        ]);
        let default = resolved.get("default").unwrap();
        assert_eq!(default.len(), 1);
        assert_eq!(default.families()[0].family_name(), "late");
    }
}
