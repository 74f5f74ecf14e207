mod bindings;
mod decoder;
mod notation;

pub use bindings::{
    default_emacs_keymap, default_isearch_keymap, default_menu_keymap,
    default_vicmd_keymap, default_viins_keymap, default_viopp_keymap,
    default_visual_keymap,
};
pub use decoder::{Decoded, InputDecoder};
pub use notation::{ctrl, keyseq};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::result::{ReadlineError, Result};

/// What a key sequence resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding {
    /// Run the named widget
    Widget(String),
    /// Replay the bytes as if typed
    Macro(Vec<u8>),
    /// Defer to another keymap's binding for a sequence
    Reference {
        keymap: String,
        seq: Vec<u8>,
    },
}

impl Binding {
    pub fn widget(name: impl Into<String>) -> Self {
        Binding::Widget(name.into())
    }
}

/// Result of resolving a byte sequence against a [`KeyMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Nothing bound at or below this sequence
    Unbound,
    /// The sequence is a strict prefix of at least one binding
    Prefix,
    /// Complete binding, no longer match possible
    Exact(&'a Binding),
    /// Complete binding that is also a prefix of a longer one; the decoder
    /// resolves this with the ambiguous-binding timeout
    ExactPrefix(&'a Binding),
}

#[derive(Debug, Clone, Default)]
struct Node {
    binding: Option<Binding>,
    children: BTreeMap<u8, Node>,
}

/// Prefix tree from byte sequences to [`Binding`]s.
///
/// The optional fallback catches bytes with no binding at all; the main
/// keymaps point it at `self-insert` so plain typing works without binding
/// every character.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    root: Node,
    fallback: Option<Binding>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: Binding) -> Self {
        KeyMap {
            root: Node::default(),
            fallback: Some(fallback),
        }
    }

    pub fn fallback(&self) -> Option<&Binding> {
        self.fallback.as_ref()
    }

    pub fn bind(&mut self, seq: &[u8], binding: Binding) -> Result<()> {
        if seq.is_empty() {
            return Err(ReadlineError::IllegalArgument(
                "cannot bind an empty key sequence".into(),
            ));
        }
        let mut node = &mut self.root;
        for byte in seq {
            node = node.children.entry(*byte).or_default();
        }
        node.binding = Some(binding);
        Ok(())
    }

    pub fn unbind(&mut self, seq: &[u8]) {
        fn prune(node: &mut Node, seq: &[u8]) -> bool {
            match seq.split_first() {
                None => {
                    node.binding = None;
                }
                Some((byte, rest)) => {
                    if let Some(child) = node.children.get_mut(byte) {
                        if prune(child, rest) {
                            node.children.remove(byte);
                        }
                    }
                }
            }
            node.binding.is_none() && node.children.is_empty()
        }
        prune(&mut self.root, seq);
    }

    pub fn lookup(&self, seq: &[u8]) -> Lookup<'_> {
        let mut node = &self.root;
        for byte in seq {
            match node.children.get(byte) {
                Some(child) => node = child,
                None => return Lookup::Unbound,
            }
        }
        match (&node.binding, node.children.is_empty()) {
            (None, true) => Lookup::Unbound,
            (None, false) => Lookup::Prefix,
            (Some(binding), true) => Lookup::Exact(binding),
            (Some(binding), false) => Lookup::ExactPrefix(binding),
        }
    }

    /// All complete bindings as `(sequence, binding)` pairs.
    pub fn bindings(&self) -> Vec<(Vec<u8>, &Binding)> {
        fn walk<'a>(node: &'a Node, prefix: &mut Vec<u8>, out: &mut Vec<(Vec<u8>, &'a Binding)>) {
            if let Some(binding) = &node.binding {
                out.push((prefix.clone(), binding));
            }
            for (byte, child) in &node.children {
                prefix.push(*byte);
                walk(child, prefix, out);
                prefix.pop();
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut Vec::new(), &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exact_and_prefix_states_are_distinguished() {
        let mut km = KeyMap::new();
        km.bind(b"\x1b", Binding::widget("vi-cmd-mode")).unwrap();
        km.bind(b"\x1b[A", Binding::widget("up-history")).unwrap();

        assert!(matches!(km.lookup(b"\x1b"), Lookup::ExactPrefix(_)));
        assert!(matches!(km.lookup(b"\x1b["), Lookup::Prefix));
        assert!(matches!(km.lookup(b"\x1b[A"), Lookup::Exact(_)));
        assert!(matches!(km.lookup(b"q"), Lookup::Unbound));
    }

    #[test]
    fn binding_empty_sequence_is_rejected() {
        let mut km = KeyMap::new();
        assert!(km.bind(b"", Binding::widget("beep")).is_err());
    }

    #[test]
    fn unbind_prunes_dead_branches() {
        let mut km = KeyMap::new();
        km.bind(b"\x1b[A", Binding::widget("up-history")).unwrap();
        km.unbind(b"\x1b[A");
        assert!(matches!(km.lookup(b"\x1b"), Lookup::Unbound));
    }

    #[test]
    fn bindings_lists_every_leaf() {
        let mut km = KeyMap::new();
        km.bind(b"\x01", Binding::widget("beginning-of-line")).unwrap();
        km.bind(b"\x05", Binding::widget("end-of-line")).unwrap();
        let all = km.bindings();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, b"\x01");
    }
}
