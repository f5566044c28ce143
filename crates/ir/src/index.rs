//! Lookup of definitions by fully-qualified name.
//!
//! The index maps every FQN in a schema to the position of its definition. It
//! is built the first time a schema is queried and cached inside that schema.

use std::collections::BTreeMap;

use tracing::debug;

use crate::ast::{Constant, Enum, File, Function, IdlSchema, Message, MessageKind, Service, Typedef};

/// Split `path#name` into `(path, name)`.
pub fn split_fqn(fqn: &str) -> Option<(&str, &str)> {
    fqn.split_once('#')
}

/// A borrowed definition found through the index.
#[derive(Debug, Clone, Copy)]
pub enum Definition<'a> {
    /// A service.
    Service(&'a Service),
    /// A service function.
    Function(&'a Function),
    /// A struct, union or exception.
    Message(&'a Message),
    /// An enumeration.
    Enum(&'a Enum),
    /// A named constant.
    Constant(&'a Constant),
    /// A type alias.
    Typedef(&'a Typedef),
}

impl<'a> Definition<'a> {
    /// Declared name; the alias for typedefs.
    pub fn name(&self) -> &'a str {
        match self {
            Self::Service(s) => &s.name,
            Self::Function(f) => &f.name,
            Self::Message(m) => &m.name,
            Self::Enum(e) => &e.name,
            Self::Constant(c) => &c.name,
            Self::Typedef(t) => &t.alias,
        }
    }

    /// Fully-qualified name.
    pub fn fqn(&self) -> &'a str {
        match self {
            Self::Service(s) => &s.fqn,
            Self::Function(f) => &f.fqn,
            Self::Message(m) => &m.fqn,
            Self::Enum(e) => &e.fqn,
            Self::Constant(c) => &c.fqn,
            Self::Typedef(t) => &t.fqn,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Service(usize, usize),
    Function(usize, usize, usize),
    Message(usize, usize),
    Enum(usize, usize),
    Constant(usize, usize),
    Typedef(usize, usize),
}

/// FQN -> definition position. Cached per [`IdlSchema`].
#[derive(Debug, Clone, Default)]
pub(crate) struct DefinitionIndex {
    slots: BTreeMap<String, Slot>,
}

impl DefinitionIndex {
    fn build(files: &[File]) -> Self {
        let mut slots = BTreeMap::new();
        let mut insert = |fqn: &str, slot: Slot| {
            if !fqn.is_empty() {
                slots.entry(fqn.to_string()).or_insert(slot);
            }
        };

        for (f, file) in files.iter().enumerate() {
            let defs = &file.definitions;
            for (i, service) in defs.services.iter().enumerate() {
                insert(&service.fqn, Slot::Service(f, i));
                for (j, function) in service.functions.iter().enumerate() {
                    insert(&function.fqn, Slot::Function(f, i, j));
                }
            }
            for (i, message) in defs.messages.iter().enumerate() {
                insert(&message.fqn, Slot::Message(f, i));
            }
            for (i, e) in defs.enums.iter().enumerate() {
                insert(&e.fqn, Slot::Enum(f, i));
            }
            for (i, constant) in defs.constants.iter().enumerate() {
                insert(&constant.fqn, Slot::Constant(f, i));
            }
            for (i, typedef) in defs.typedefs.iter().enumerate() {
                insert(&typedef.fqn, Slot::Typedef(f, i));
            }
        }

        debug!(definitions = slots.len(), "built FQN index");
        Self { slots }
    }

    fn resolve<'a>(files: &'a [File], slot: Slot) -> Option<Definition<'a>> {
        let defs = |f: usize| files.get(f).map(|file| &file.definitions);
        Some(match slot {
            Slot::Service(f, i) => Definition::Service(defs(f)?.services.get(i)?),
            Slot::Function(f, i, j) => {
                Definition::Function(defs(f)?.services.get(i)?.functions.get(j)?)
            }
            Slot::Message(f, i) => Definition::Message(defs(f)?.messages.get(i)?),
            Slot::Enum(f, i) => Definition::Enum(defs(f)?.enums.get(i)?),
            Slot::Constant(f, i) => Definition::Constant(defs(f)?.constants.get(i)?),
            Slot::Typedef(f, i) => Definition::Typedef(defs(f)?.typedefs.get(i)?),
        })
    }
}

impl IdlSchema {
    fn definition_index(&self) -> &DefinitionIndex {
        self.index.get_or_init(|| DefinitionIndex::build(self.files()))
    }

    /// Definitions matching `fqn`.
    ///
    /// An exact FQN match wins. Otherwise every definition whose FQN ends in
    /// `#<fqn>` is returned in FQN order, so `User` or `Service.call` can be
    /// looked up without knowing the file.
    pub fn find_by_fqn(&self, fqn: &str) -> Vec<Definition<'_>> {
        let index = self.definition_index();
        let files = self.files();
        if let Some(slot) = index.slots.get(fqn) {
            return DefinitionIndex::resolve(files, *slot).into_iter().collect();
        }
        let suffix = format!("#{fqn}");
        index
            .slots
            .iter()
            .filter(|(key, _)| key.ends_with(&suffix))
            .filter_map(|(_, slot)| DefinitionIndex::resolve(files, *slot))
            .collect()
    }

    fn find_kind<'a, T: ?Sized>(
        &'a self,
        fqn: &str,
        pick: impl Fn(Definition<'a>) -> Option<&'a T>,
    ) -> Vec<&'a T> {
        self.find_by_fqn(fqn).into_iter().filter_map(pick).collect()
    }

    /// Services matching `fqn`.
    pub fn find_services(&self, fqn: &str) -> Vec<&Service> {
        self.find_kind(fqn, |d| match d {
            Definition::Service(s) => Some(s),
            _ => None,
        })
    }

    /// Functions matching `fqn`; function FQNs end in `<Service>.<name>`.
    pub fn find_functions(&self, fqn: &str) -> Vec<&Function> {
        self.find_kind(fqn, |d| match d {
            Definition::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Structs, unions and exceptions.
    pub fn find_messages(&self, fqn: &str) -> Vec<&Message> {
        self.find_kind(fqn, |d| match d {
            Definition::Message(m) => Some(m),
            _ => None,
        })
    }

    /// Structs matching `fqn`.
    pub fn find_structs(&self, fqn: &str) -> Vec<&Message> {
        self.find_messages_of(fqn, MessageKind::Struct)
    }

    /// Unions matching `fqn`.
    pub fn find_unions(&self, fqn: &str) -> Vec<&Message> {
        self.find_messages_of(fqn, MessageKind::Union)
    }

    /// Exceptions matching `fqn`.
    pub fn find_exceptions(&self, fqn: &str) -> Vec<&Message> {
        self.find_messages_of(fqn, MessageKind::Exception)
    }

    fn find_messages_of(&self, fqn: &str, kind: MessageKind) -> Vec<&Message> {
        self.find_messages(fqn)
            .into_iter()
            .filter(|m| m.kind == kind)
            .collect()
    }

    /// Enums matching `fqn`.
    pub fn find_enums(&self, fqn: &str) -> Vec<&Enum> {
        self.find_kind(fqn, |d| match d {
            Definition::Enum(e) => Some(e),
            _ => None,
        })
    }

    /// Constants matching `fqn`.
    pub fn find_constants(&self, fqn: &str) -> Vec<&Constant> {
        self.find_kind(fqn, |d| match d {
            Definition::Constant(c) => Some(c),
            _ => None,
        })
    }

    /// Typedefs matching `fqn`.
    pub fn find_typedefs(&self, fqn: &str) -> Vec<&Typedef> {
        self.find_kind(fqn, |d| match d {
            Definition::Typedef(t) => Some(t),
            _ => None,
        })
    }
}
