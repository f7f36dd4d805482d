//! Arena-based mutable syntax tree
//!
//! Nodes live in a flat arena and are addressed by opaque [`NodeId`] handles.
//! Parents own their children through ordered handle lists; replacement and
//! removal rewrite the parent's child list and mark the detached subtree dead,
//! so a handle never dangles and no subtree can appear at two positions.

use crate::{RecastError, Result};
use serde::{Deserialize, Serialize};

/// Kind tag for a syntax node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// Root of a parsed file
    Module,
    /// `class Name { ... }`
    ClassDecl,
    /// `const NAME = expr;` inside a class body
    ConstDecl,
    /// `fn name(params) { ... }`
    FnDecl,
    /// Parameter list of a function
    ParamList,
    /// `{ ... }` statement sequence
    Block,
    /// `let name = expr;`
    LetStmt,
    /// `return expr;`
    ReturnStmt,
    /// Expression used as a statement
    ExprStmt,
    /// Bare `;`
    EmptyStmt,
    /// `callee(args...)`; callee name in the node text
    Call,
    /// Binary expression; operator in the node text
    Binary,
    /// Identifier reference; name in the node text
    Ident,
    /// String literal; unescaped value in the node text
    StringLit,
    /// Integer literal; digits in the node text
    IntLit,
    /// `Class::member`; children are the class and member identifiers
    ClassConstFetch,
}

/// Opaque handle to a node in a [`SyntaxTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct NodeSlot {
    kind: NodeKind,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    alive: bool,
}

/// Mutable syntax tree backed by a node arena
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<NodeSlot>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new detached node
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot {
            kind,
            text: None,
            children: Vec::new(),
            parent: None,
            alive: true,
        });
        id
    }

    /// Allocate a new detached node carrying a text payload
    pub fn add_with_text(&mut self, kind: NodeKind, text: impl Into<String>) -> NodeId {
        let id = self.add(kind);
        self.nodes[id.index()].text = Some(text.into());
        id
    }

    /// Append a detached node to a parent's child list
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.nodes[child.index()].parent.is_some() {
            return Err(RecastError::tree_error(format!(
                "node {child:?} is already attached; a subtree may not appear at two positions"
            )));
        }
        if child == parent {
            return Err(RecastError::tree_error("cannot attach a node to itself"));
        }
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    /// Set (or replace) the root node
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.index()].text.as_deref()
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.index()].text = Some(text.into());
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Current child list of a node
    ///
    /// The returned slice reflects the state at the time of the call; callers
    /// that mutate the tree while iterating must re-read via [`Self::child_at`].
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Re-reading accessor for mutation-safe iteration
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[parent.index()].children.get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id.index()].children.len()
    }

    /// Whether the node is still reachable (not part of a detached subtree)
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes[id.index()].alive
    }

    /// Number of live nodes in the arena
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.alive).count()
    }

    /// Atomically swap `old` for `new` at `old`'s position
    ///
    /// `new` may be a descendant of `old` (e.g. a simplification keeping one
    /// operand); it is detached from its current position first. The rest of
    /// `old`'s subtree is marked dead.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if !self.nodes[old.index()].alive {
            return Err(RecastError::tree_error(format!(
                "cannot replace dead node {old:?}"
            )));
        }

        // A replacement that is an ancestor of the node it replaces would
        // create a cycle.
        if self.is_ancestor_of(new, old) == Some(true) {
            return Err(RecastError::tree_error(
                "replacement node is an ancestor of the node being replaced",
            ));
        }

        // Free the replacement from wherever it currently sits.
        self.detach(new);

        match self.nodes[old.index()].parent {
            Some(parent) => {
                let pos = self.nodes[parent.index()]
                    .children
                    .iter()
                    .position(|&c| c == old)
                    .ok_or_else(|| {
                        RecastError::tree_error("node missing from its parent's child list")
                    })?;
                self.nodes[old.index()].parent = None;
                self.nodes[parent.index()].children[pos] = new;
                self.nodes[new.index()].parent = Some(parent);
            }
            None => {
                if self.root != Some(old) {
                    return Err(RecastError::tree_error(
                        "cannot replace a detached non-root node",
                    ));
                }
                self.root = Some(new);
            }
        }

        self.mark_dead(old);
        Ok(())
    }

    /// Detach a node from its parent's child list and mark its subtree dead
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if self.root == Some(id) {
            return Err(RecastError::tree_error("cannot remove the root node"));
        }
        if !self.nodes[id.index()].alive {
            return Err(RecastError::tree_error(format!(
                "cannot remove dead node {id:?}"
            )));
        }
        self.detach(id);
        self.mark_dead(id);
        Ok(())
    }

    /// All live descendants of a node in pre-order, excluding the node itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Whether `ancestor` is on the parent chain of `node`
    ///
    /// Returns `None` when either handle is dead.
    fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> Option<bool> {
        if !self.nodes[ancestor.index()].alive || !self.nodes[node.index()].alive {
            return None;
        }
        let mut cursor = self.nodes[node.index()].parent;
        while let Some(id) = cursor {
            if id == ancestor {
                return Some(true);
            }
            cursor = self.nodes[id.index()].parent;
        }
        Some(false)
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent {
            self.nodes[parent.index()].children.retain(|&c| c != id);
            self.nodes[id.index()].parent = None;
        }
    }

    fn mark_dead(&mut self, id: NodeId) {
        self.nodes[id.index()].alive = false;
        let children = self.nodes[id.index()].children.clone();
        for child in children {
            self.mark_dead(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> (SyntaxTree, NodeId, NodeId, NodeId) {
        let mut tree = SyntaxTree::new();
        let module = tree.add(NodeKind::Module);
        tree.set_root(module);
        let stmt = tree.add(NodeKind::ExprStmt);
        let lit = tree.add_with_text(NodeKind::StringLit, "hello");
        tree.attach(module, stmt).unwrap();
        tree.attach(stmt, lit).unwrap();
        (tree, module, stmt, lit)
    }

    #[test]
    fn attach_rejects_aliasing() {
        let (mut tree, module, _stmt, lit) = small_tree();
        let err = tree.attach(module, lit).unwrap_err();
        assert!(err.to_string().contains("already attached"));
    }

    #[test]
    fn replace_swaps_in_place_and_kills_old_subtree() {
        let (mut tree, _module, stmt, lit) = small_tree();
        let fetch = tree.add(NodeKind::ClassConstFetch);
        let class = tree.add_with_text(NodeKind::Ident, "Hello");
        let member = tree.add_with_text(NodeKind::Ident, "class");
        tree.attach(fetch, class).unwrap();
        tree.attach(fetch, member).unwrap();

        tree.replace(lit, fetch).unwrap();

        assert_eq!(tree.children(stmt), &[fetch]);
        assert_eq!(tree.parent(fetch), Some(stmt));
        assert!(!tree.is_alive(lit));
        assert!(tree.is_alive(fetch));
    }

    #[test]
    fn replace_with_descendant_keeps_operand() {
        let mut tree = SyntaxTree::new();
        let module = tree.add(NodeKind::Module);
        tree.set_root(module);
        let stmt = tree.add(NodeKind::ExprStmt);
        let mul = tree.add_with_text(NodeKind::Binary, "*");
        let x = tree.add_with_text(NodeKind::Ident, "x");
        let one = tree.add_with_text(NodeKind::IntLit, "1");
        tree.attach(module, stmt).unwrap();
        tree.attach(stmt, mul).unwrap();
        tree.attach(mul, x).unwrap();
        tree.attach(mul, one).unwrap();

        // x * 1 -> x
        tree.replace(mul, x).unwrap();

        assert_eq!(tree.children(stmt), &[x]);
        assert!(tree.is_alive(x));
        assert!(!tree.is_alive(mul));
        assert!(!tree.is_alive(one));
    }

    #[test]
    fn remove_detaches_subtree() {
        let (mut tree, module, stmt, lit) = small_tree();
        tree.remove(stmt).unwrap();
        assert!(tree.children(module).is_empty());
        assert!(!tree.is_alive(stmt));
        assert!(!tree.is_alive(lit));
    }

    #[test]
    fn remove_root_is_rejected() {
        let (mut tree, module, _, _) = small_tree();
        assert!(tree.remove(module).is_err());
    }

    #[test]
    fn replace_root() {
        let (mut tree, module, _, _) = small_tree();
        let fresh = tree.add(NodeKind::Module);
        tree.replace(module, fresh).unwrap();
        assert_eq!(tree.root(), Some(fresh));
        assert!(!tree.is_alive(module));
    }

    #[test]
    fn descendants_are_preorder() {
        let (tree, module, stmt, lit) = small_tree();
        assert_eq!(tree.descendants(module), vec![stmt, lit]);
    }
}
