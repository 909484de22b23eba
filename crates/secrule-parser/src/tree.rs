//! Uniform node access and a navigable, parent-aware view of a [`Document`].
//!
//! The owned AST only links containers to their children. [`Tree`] flattens
//! a borrowed document into an arena where every entry knows its parent by
//! index, so an action can find the rule it belongs to without the AST
//! holding back-references.

use crate::ast::{
    Action, CollectionSelector, Comment, CtlOption, Directive, Document, DocumentItem, Operator,
    VariableList, VariableSelector,
};
use crate::position::{Position, Positioned};
use crate::value::{ExpandableString, StringPart};

/// Capabilities shared by every AST node.
pub trait Node {
    /// Human-readable node name: a directive keyword, action name, variable
    /// name, ...
    fn name(&self) -> &str;

    /// Owned child nodes in source order.
    fn children(&self) -> Vec<NodeRef<'_>>;
}

/// A borrowed reference to any AST node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Document(&'a Document),
    Comment(&'a Comment),
    Directive(&'a Directive),
    VariableList(&'a VariableList),
    VariableSelector(&'a VariableSelector),
    CollectionSelector(&'a CollectionSelector),
    Operator(&'a Operator),
    Action(&'a Positioned<Action>),
    CtlOption(&'a CtlOption),
    ExpandableString(&'a ExpandableString),
    StringPart(&'a StringPart),
}

impl<'a> NodeRef<'a> {
    /// Source position, for the node kinds that record one.
    pub fn position(&self) -> Option<&'a Position> {
        match *self {
            NodeRef::Comment(c) => Some(&c.position),
            NodeRef::Directive(d) => Some(d.position()),
            NodeRef::VariableSelector(s) => Some(&s.position),
            NodeRef::Operator(o) => Some(&o.position),
            NodeRef::Action(a) => Some(&a.position),
            _ => None,
        }
    }

    pub fn as_directive(&self) -> Option<&'a Directive> {
        match *self {
            NodeRef::Directive(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<&'a Positioned<Action>> {
        match *self {
            NodeRef::Action(a) => Some(a),
            _ => None,
        }
    }

    /// Like [`Node::children`], but the references live as long as the
    /// underlying AST rather than this `NodeRef`.
    pub fn child_refs(&self) -> Vec<NodeRef<'a>> {
        match *self {
            NodeRef::Document(d) => d
                .items
                .iter()
                .map(|item| match item {
                    DocumentItem::Comment(c) => NodeRef::Comment(c),
                    DocumentItem::Directive(d) => NodeRef::Directive(d),
                })
                .collect(),
            NodeRef::Comment(_) | NodeRef::CollectionSelector(_) | NodeRef::StringPart(_) => {
                Vec::new()
            }
            NodeRef::Directive(d) => match d {
                Directive::SecRule(rule) => {
                    let mut children = vec![
                        NodeRef::VariableList(&rule.variables),
                        NodeRef::Operator(&rule.operator),
                    ];
                    children.extend(rule.actions.iter().map(NodeRef::Action));
                    children
                }
                Directive::SecAction(action) | Directive::SecDefaultAction(action) => {
                    action.actions.iter().map(NodeRef::Action).collect()
                }
                _ => Vec::new(),
            },
            NodeRef::VariableList(list) => list.iter().map(NodeRef::VariableSelector).collect(),
            NodeRef::VariableSelector(s) => s
                .selector
                .iter()
                .map(NodeRef::CollectionSelector)
                .collect(),
            NodeRef::Operator(o) => o
                .kind
                .argument()
                .into_iter()
                .map(NodeRef::ExpandableString)
                .collect(),
            NodeRef::Action(a) => match &a.node {
                Action::Ctl(option) => vec![NodeRef::CtlOption(option)],
                action => action
                    .strings()
                    .into_iter()
                    .map(NodeRef::ExpandableString)
                    .collect(),
            },
            NodeRef::CtlOption(option) => option
                .target()
                .into_iter()
                .map(NodeRef::VariableSelector)
                .collect(),
            NodeRef::ExpandableString(s) => s.parts.iter().map(NodeRef::StringPart).collect(),
        }
    }
}

impl<'a> NodeRef<'a> {
    /// The node name with the lifetime of the underlying AST.
    pub fn label(self) -> &'a str {
        match self {
            NodeRef::Document(d) => d.name.as_str(),
            NodeRef::Comment(_) => "comment",
            NodeRef::Directive(d) => d.keyword(),
            NodeRef::VariableList(_) => "variables",
            NodeRef::VariableSelector(s) => s.variable.name(),
            NodeRef::CollectionSelector(CollectionSelector::Key(_)) => "key",
            NodeRef::CollectionSelector(CollectionSelector::Regex(_)) => "regex",
            NodeRef::Operator(o) => o.kind.name(),
            NodeRef::Action(a) => a.node.name(),
            NodeRef::CtlOption(option) => option.name(),
            NodeRef::ExpandableString(_) => "string",
            NodeRef::StringPart(StringPart::Literal(_)) => "literal",
            NodeRef::StringPart(StringPart::Macro(_)) => "macro",
        }
    }
}

impl Node for NodeRef<'_> {
    fn name(&self) -> &str {
        self.label()
    }

    fn children(&self) -> Vec<NodeRef<'_>> {
        self.child_refs()
    }
}

macro_rules! impl_node {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Node for $ty {
                fn name(&self) -> &str {
                    NodeRef::$variant(self).label()
                }

                fn children(&self) -> Vec<NodeRef<'_>> {
                    NodeRef::$variant(self).child_refs()
                }
            }
        )*
    };
}

impl_node! {
    Document => Document,
    Comment => Comment,
    Directive => Directive,
    VariableList => VariableList,
    VariableSelector => VariableSelector,
    CollectionSelector => CollectionSelector,
    Operator => Operator,
    Positioned<Action> => Action,
    CtlOption => CtlOption,
    ExpandableString => ExpandableString,
    StringPart => StringPart,
}

// =============================================================================
// Tree
// =============================================================================

/// Index of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Entry<'a> {
    node: NodeRef<'a>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena view of a document. Entries are stored in pre-order, so the root is
/// [`Tree::root`] and a node's descendants follow it.
#[derive(Debug)]
pub struct Tree<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> Tree<'a> {
    pub fn new(document: &'a Document) -> Self {
        let mut tree = Tree {
            entries: Vec::new(),
        };
        tree.insert(NodeRef::Document(document), None);
        tree
    }

    fn insert(&mut self, node: NodeRef<'a>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Entry {
            node,
            parent,
            children: Vec::new(),
        });
        for child in node.child_refs() {
            let child_id = self.insert(child, Some(id));
            self.entries[id.0].children.push(child_id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'a>> {
        self.entries.get(id.0).map(|e| e.node)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(id.0).and_then(|e| e.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.entries.get(id.0) {
            Some(entry) => &entry.children,
            None => &[],
        }
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// The directive containing `id` (or `id` itself if it is a directive).
    pub fn enclosing_directive(&self, id: NodeId) -> Option<&'a Directive> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| self.get(n).and_then(|node| node.as_directive()))
    }

    /// All node ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.entries.len()).map(NodeId)
    }

    pub fn actions(&self) -> impl Iterator<Item = (NodeId, &'a Positioned<Action>)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.node.as_action().map(|a| (NodeId(i), a)))
    }
}

impl Document {
    /// Build the parent-aware [`Tree`] view of this document.
    pub fn tree(&self) -> Tree<'_> {
        Tree::new(self)
    }
}
