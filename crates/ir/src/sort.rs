//! Dependency ordering of the definitions inside one file.

use std::collections::{BTreeSet, HashMap};

use crate::ast::{Definitions, IdlSchema, Type};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Message,
    Enum,
    Typedef,
    Constant,
    Service,
}

struct Node {
    kind: Kind,
    position: usize,
    deps: Vec<String>,
}

/// Same-file type names referenced by `ty`. Qualified names point at other
/// files and are skipped.
fn local_refs(ty: &Type, out: &mut Vec<String>) {
    ty.walk(&mut |t| {
        if let Type::Named { name, .. } = t
            && !name.contains('.')
        {
            out.push(name.clone());
        }
    });
}

fn collect_nodes(defs: &Definitions) -> (Vec<Node>, Vec<String>) {
    let mut nodes = Vec::new();
    let mut names = Vec::new();

    for (position, m) in defs.messages.iter().enumerate() {
        let mut deps = Vec::new();
        for field in &m.fields {
            local_refs(&field.field_type, &mut deps);
        }
        names.push(m.name.clone());
        nodes.push(Node { kind: Kind::Message, position, deps });
    }
    for (position, e) in defs.enums.iter().enumerate() {
        names.push(e.name.clone());
        nodes.push(Node { kind: Kind::Enum, position, deps: Vec::new() });
    }
    for (position, t) in defs.typedefs.iter().enumerate() {
        let mut deps = Vec::new();
        local_refs(&t.target, &mut deps);
        names.push(t.alias.clone());
        nodes.push(Node { kind: Kind::Typedef, position, deps });
    }
    for (position, c) in defs.constants.iter().enumerate() {
        let mut deps = Vec::new();
        local_refs(&c.const_type, &mut deps);
        names.push(c.name.clone());
        nodes.push(Node { kind: Kind::Constant, position, deps });
    }
    for (position, s) in defs.services.iter().enumerate() {
        let mut deps: Vec<String> = s.extends.iter().cloned().collect();
        for f in &s.functions {
            local_refs(&f.return_type, &mut deps);
            for field in f.parameters.iter().chain(&f.throws) {
                local_refs(&field.field_type, &mut deps);
            }
        }
        names.push(s.name.clone());
        nodes.push(Node { kind: Kind::Service, position, deps });
    }
    (nodes, names)
}

/// Reorder each definition list so that a definition comes after the
/// same-file definitions it references.
///
/// Ready definitions are taken in first-seen order (messages, enums,
/// typedefs, constants, services). Definitions caught in a cycle are appended
/// in first-seen order; nothing is dropped.
pub fn sort_definitions(defs: &mut Definitions) {
    let (nodes, names) = collect_nodes(defs);
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (i, name) in names.iter().enumerate() {
        by_name.entry(name.as_str()).or_insert(i);
    }

    let mut pending = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        let targets: BTreeSet<usize> = node
            .deps
            .iter()
            .filter_map(|d| by_name.get(d.as_str()).copied())
            .filter(|&t| t != i)
            .collect();
        pending[i] = targets.len();
        for t in targets {
            dependents[t].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());
    let mut placed = vec![false; nodes.len()];
    while let Some(next) = ready.pop_first() {
        order.push(next);
        placed[next] = true;
        for &d in &dependents[next] {
            pending[d] -= 1;
            if pending[d] == 0 {
                ready.insert(d);
            }
        }
    }
    order.extend((0..nodes.len()).filter(|&i| !placed[i]));

    let mut messages = std::mem::take(&mut defs.messages).into_iter().map(Some).collect::<Vec<_>>();
    let mut enums = std::mem::take(&mut defs.enums).into_iter().map(Some).collect::<Vec<_>>();
    let mut typedefs = std::mem::take(&mut defs.typedefs).into_iter().map(Some).collect::<Vec<_>>();
    let mut constants = std::mem::take(&mut defs.constants).into_iter().map(Some).collect::<Vec<_>>();
    let mut services = std::mem::take(&mut defs.services).into_iter().map(Some).collect::<Vec<_>>();

    for i in order {
        let Node { kind, position, .. } = nodes[i];
        match kind {
            Kind::Message => defs.messages.extend(messages[position].take()),
            Kind::Enum => defs.enums.extend(enums[position].take()),
            Kind::Typedef => defs.typedefs.extend(typedefs[position].take()),
            Kind::Constant => defs.constants.extend(constants[position].take()),
            Kind::Service => defs.services.extend(services[position].take()),
        }
    }
}

impl IdlSchema {
    /// Apply [`sort_definitions`] to every file.
    pub fn sort_definitions(&mut self) {
        for file in self.files_mut() {
            sort_definitions(&mut file.definitions);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ast::{Field, Message, Requiredness, Typedef};

    fn message(name: &str, refs: &[&str]) -> Message {
        Message {
            name: name.into(),
            fields: refs
                .iter()
                .map(|r| Field::new(r.to_lowercase(), Type::named(*r, None), Requiredness::Optional))
                .collect(),
            ..Message::default()
        }
    }

    fn names(defs: &Definitions) -> Vec<&str> {
        defs.messages.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let mut defs = Definitions {
            messages: vec![message("Order", &["Item", "user.User"]), message("Item", &["Sku"])],
            typedefs: vec![Typedef {
                alias: "Sku".into(),
                target: Type::string(),
                ..Typedef::default()
            }],
            ..Definitions::default()
        };
        sort_definitions(&mut defs);
        assert_eq!(names(&defs), ["Item", "Order"]);
        assert_eq!(defs.typedefs.len(), 1);
    }

    #[test]
    fn test_independent_definitions_keep_order() {
        let mut defs = Definitions {
            messages: vec![message("B", &[]), message("A", &[]), message("C", &[])],
            ..Definitions::default()
        };
        sort_definitions(&mut defs);
        assert_eq!(names(&defs), ["B", "A", "C"]);
    }

    #[test]
    fn test_cycles_are_kept() {
        let mut defs = Definitions {
            messages: vec![
                message("Tree", &["Node"]),
                message("Node", &["Tree"]),
                message("Leaf", &[]),
                message("Self", &["Self"]),
            ],
            ..Definitions::default()
        };
        sort_definitions(&mut defs);
        assert_eq!(names(&defs), ["Leaf", "Self", "Tree", "Node"]);
    }
}
