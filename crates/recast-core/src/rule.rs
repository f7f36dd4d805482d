//! Transformation rules, the rule registry, and ambient rule context

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::tree::{NodeId, NodeKind, SyntaxTree};
use crate::Result;

/// Minimum source-language feature level a rule requires
///
/// Rules whose level exceeds the configured target are silently skipped.
pub type LanguageLevel = u32;

/// Default target level: everything enabled
pub const LATEST_LEVEL: LanguageLevel = 100;

/// Instruction a rule hands back to the traversal controller for one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Nothing to do for this node
    Unchanged,
    /// Swap the visited node for this (freshly built) node
    Replace(NodeId),
    /// Excise the visited node from its parent
    Remove,
    /// Keep the node but do not descend into its children
    SkipChildren,
    /// Record a diagnostic and leave this subtree as-is
    AbortBranch,
}

/// A single source transformation
///
/// Implementations must be deterministic: the same node under the same
/// context must always yield the same directive, or output stops being
/// reproducible across runs and worker counts.
pub trait TransformRule: Send + Sync {
    /// Stable rule name, used in reports and the rule-set fingerprint
    fn name(&self) -> &str;

    /// Node kinds this rule wants to see
    fn interested_kinds(&self) -> &[NodeKind];

    /// Minimum language feature level this rule requires
    fn min_level(&self) -> LanguageLevel {
        0
    }

    /// Seed for the rule-set fingerprint
    ///
    /// Must cover every construction-time parameter: two differently
    /// configured instances of the same rule must produce different seeds so
    /// the change cache invalidates.
    fn fingerprint_seed(&self) -> String {
        self.name().to_string()
    }

    /// Apply the rule to `node`, possibly mutating the tree
    fn apply(&self, tree: &mut SyntaxTree, node: NodeId, ctx: &mut RuleContext)
        -> Result<Directive>;
}

/// Scope/type query service consulted by rules (not by the engine itself)
pub trait NameResolver: Send + Sync {
    /// Resolve a name to its fully qualified form, if it names a known class
    fn resolve_class(&self, name: &str) -> Option<String>;
}

/// Name resolver backed by the class declarations of a single tree
#[derive(Debug, Default, Clone)]
pub struct ScopeIndex {
    classes: BTreeSet<String>,
}

impl ScopeIndex {
    /// Collect every class declared in the tree
    pub fn from_tree(tree: &SyntaxTree) -> Self {
        let mut classes = BTreeSet::new();
        if let Some(root) = tree.root() {
            for id in tree.descendants(root) {
                if tree.kind(id) == NodeKind::ClassDecl {
                    if let Some(name) = tree.text(id) {
                        classes.insert(name.to_string());
                    }
                }
            }
        }
        Self { classes }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl NameResolver for ScopeIndex {
    fn resolve_class(&self, name: &str) -> Option<String> {
        let trimmed = name.trim_start_matches('\\');
        self.classes.contains(trimmed).then(|| trimmed.to_string())
    }
}

/// Ambient context handed to every rule application
///
/// Carries the current file identity plus a transient attribute side-table
/// rules use to pass markers within a single pass. The table is keyed by node
/// handle and cleared between passes and between files.
pub struct RuleContext<'a> {
    path: &'a Path,
    source: &'a str,
    resolver: Arc<dyn NameResolver>,
    attrs: HashMap<(NodeId, &'static str), String>,
}

impl<'a> RuleContext<'a> {
    pub fn new(path: &'a Path, source: &'a str, resolver: Arc<dyn NameResolver>) -> Self {
        Self {
            path,
            source,
            resolver,
            attrs: HashMap::new(),
        }
    }

    /// Path of the file being transformed
    pub fn path(&self) -> &Path {
        self.path
    }

    /// Original source text of the file
    pub fn source(&self) -> &str {
        self.source
    }

    /// Scope query service
    pub fn resolver(&self) -> &dyn NameResolver {
        self.resolver.as_ref()
    }

    /// Set a transient attribute on a node
    pub fn set_attr(&mut self, node: NodeId, key: &'static str, value: impl Into<String>) {
        self.attrs.insert((node, key), value.into());
    }

    /// Read a transient attribute
    pub fn attr(&self, node: NodeId, key: &'static str) -> Option<&str> {
        self.attrs.get(&(node, key)).map(String::as_str)
    }

    pub fn has_attr(&self, node: NodeId, key: &'static str) -> bool {
        self.attrs.contains_key(&(node, key))
    }

    /// Drop all attributes
    ///
    /// The built-in pass loop rebuilds the context each pass instead; this
    /// is for drivers that reuse one context across passes.
    pub fn clear_attrs(&mut self) {
        self.attrs.clear();
    }
}

/// Hex-encoded fingerprint of an active rule set and its configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleSetFingerprint(String);

impl RuleSetFingerprint {
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// Ordered collection of transformation rules
///
/// Application order is registration order, which must be stable across runs;
/// per-kind interest lists are computed once at registration and reused for
/// every node of that kind.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn TransformRule>>,
    interest: HashMap<NodeKind, Vec<usize>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule; later registrations run after earlier ones
    pub fn register(&mut self, rule: Arc<dyn TransformRule>) {
        let index = self.rules.len();
        for &kind in rule.interested_kinds() {
            self.interest.entry(kind).or_default().push(index);
        }
        tracing::debug!(rule = rule.name(), index, "registered rule");
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, index: usize) -> &dyn TransformRule {
        self.rules[index].as_ref()
    }

    /// Registry-ordered indices of rules interested in `kind`
    pub fn rules_for(&self, kind: NodeKind) -> &[usize] {
        self.interest.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First rule interested in `kind` with registry index >= `min_index`
    ///
    /// This is how the traversal resumes after a replacement changed the
    /// node's kind: later rules observe the node as mutated by earlier rules,
    /// and no rule runs twice for one visit.
    pub fn next_interested(&self, kind: NodeKind, min_index: usize) -> Option<usize> {
        self.rules_for(kind).iter().copied().find(|&i| i >= min_index)
    }

    /// Iterate rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = &dyn TransformRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Fingerprint of the active rule set and its configuration
    ///
    /// Any change to the set, its order, or any rule's parameters yields a
    /// different fingerprint, which invalidates every change-cache entry.
    pub fn fingerprint(&self) -> RuleSetFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.rules.len().to_le_bytes());
        for rule in &self.rules {
            let seed = rule.fingerprint_seed();
            hasher.update(seed.len().to_le_bytes());
            hasher.update(seed.as_bytes());
        }
        RuleSetFingerprint(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        name: &'static str,
        kinds: Vec<NodeKind>,
        seed: String,
    }

    impl TransformRule for Dummy {
        fn name(&self) -> &str {
            self.name
        }

        fn interested_kinds(&self) -> &[NodeKind] {
            &self.kinds
        }

        fn fingerprint_seed(&self) -> String {
            self.seed.clone()
        }

        fn apply(
            &self,
            _tree: &mut SyntaxTree,
            _node: NodeId,
            _ctx: &mut RuleContext,
        ) -> Result<Directive> {
            Ok(Directive::Unchanged)
        }
    }

    fn dummy(name: &'static str, kinds: Vec<NodeKind>) -> Arc<dyn TransformRule> {
        Arc::new(Dummy {
            name,
            kinds,
            seed: name.to_string(),
        })
    }

    #[test]
    fn interest_lists_preserve_registration_order() {
        let mut registry = RuleRegistry::new();
        registry.register(dummy("b", vec![NodeKind::StringLit]));
        registry.register(dummy("a", vec![NodeKind::StringLit, NodeKind::Call]));
        registry.register(dummy("c", vec![NodeKind::Call]));

        assert_eq!(registry.rules_for(NodeKind::StringLit), &[0, 1]);
        assert_eq!(registry.rules_for(NodeKind::Call), &[1, 2]);
        assert!(registry.rules_for(NodeKind::Module).is_empty());
    }

    #[test]
    fn next_interested_resumes_after_index() {
        let mut registry = RuleRegistry::new();
        registry.register(dummy("a", vec![NodeKind::Call]));
        registry.register(dummy("b", vec![NodeKind::StringLit]));
        registry.register(dummy("c", vec![NodeKind::Call]));

        assert_eq!(registry.next_interested(NodeKind::Call, 0), Some(0));
        assert_eq!(registry.next_interested(NodeKind::Call, 1), Some(2));
        assert_eq!(registry.next_interested(NodeKind::Call, 3), None);
    }

    #[test]
    fn fingerprint_changes_with_configuration() {
        let mut a = RuleRegistry::new();
        a.register(Arc::new(Dummy {
            name: "r",
            kinds: vec![NodeKind::Call],
            seed: "r:skip=[]".into(),
        }));

        let mut b = RuleRegistry::new();
        b.register(Arc::new(Dummy {
            name: "r",
            kinds: vec![NodeKind::Call],
            seed: "r:skip=[Foo]".into(),
        }));

        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_is_order_sensitive() {
        let mut ab = RuleRegistry::new();
        ab.register(dummy("a", vec![NodeKind::Call]));
        ab.register(dummy("b", vec![NodeKind::Call]));

        let mut ba = RuleRegistry::new();
        ba.register(dummy("b", vec![NodeKind::Call]));
        ba.register(dummy("a", vec![NodeKind::Call]));

        assert_ne!(ab.fingerprint(), ba.fingerprint());
    }

    #[test]
    fn scope_index_resolves_declared_classes() {
        let mut tree = SyntaxTree::new();
        let module = tree.add(NodeKind::Module);
        tree.set_root(module);
        let class = tree.add_with_text(NodeKind::ClassDecl, "AnotherClass");
        tree.attach(module, class).unwrap();

        let scope = ScopeIndex::from_tree(&tree);
        assert_eq!(
            scope.resolve_class("AnotherClass"),
            Some("AnotherClass".to_string())
        );
        assert_eq!(scope.resolve_class("\\AnotherClass").as_deref(), Some("AnotherClass"));
        assert_eq!(scope.resolve_class("Missing"), None);
    }
}
