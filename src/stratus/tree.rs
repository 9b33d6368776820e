//! # Command Tree
//!
//! The command tree is the single shared data structure of the crate: plugins
//! register categories, commands, and options into it at startup; the parser,
//! dispatcher, help engine, and autocomplete engine all read it afterward and
//! never mutate it.
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to each other by copyable
//! [`NodeId`], so parent links carry no ownership and the whole tree has one
//! lifetime, fixed at startup.
//!
//! A node is a *command* when it carries [`CommandData`]. A node may hold a
//! handler **and** children at the same time: registering `list` and
//! `list details` under one parent makes `list` both a dispatchable command
//! and the parent of `details`. Path resolution always prefers descending
//! into a matching child over stopping at the handler.

use crate::dispatch::{Completion, Invocation};
use crate::error::{Result, StratusError};
use crate::options::{OptionSpec, UNIVERSAL_OPTIONS};

/// Index of a node within its [`CommandTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Command handler. Receives the positional arguments and parsed options,
/// performs its (possibly blocking) work, and signals completion exactly
/// once through the [`Completion`] handle before returning.
pub type Handler = Box<dyn Fn(&Invocation<'_>, Completion)>;

/// Declared positional argument of a command.
#[derive(Debug, Clone)]
pub struct PositionalSpec {
    pub name: String,
    pub required: bool,
}

/// Per-command registration data.
pub struct CommandData {
    pub positionals: Vec<PositionalSpec>,
    pub detailed_description: Option<String>,
    handler: Option<Handler>,
}

struct Node {
    name: String,
    parent: Option<NodeId>,
    description: String,
    options: Vec<OptionSpec>,
    children: Vec<NodeId>,
    command: Option<CommandData>,
}

pub struct CommandTree {
    nodes: Vec<Node>,
}

impl std::fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTree")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl Default for CommandTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTree {
    /// Creates a tree containing only the synthetic root category.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                description: String::new(),
                options: Vec::new(),
                children: Vec::new(),
                command: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Looks up or creates the child category `name` under `parent`.
    ///
    /// Registration is idempotent: several plugins may extend the same
    /// category, and each gets back the identical node.
    pub fn category(&mut self, parent: NodeId, name: &str) -> NodeId {
        if let Some(existing) = self.find_child(parent, name) {
            return existing;
        }
        self.push_node(parent, name)
    }

    /// Registers a command at the space-separated path `name_tokens` under
    /// `parent`, creating intermediate categories as needed.
    ///
    /// Fails with [`StratusError::DuplicateCommand`] if the exact path
    /// already has a registered handler. Universal options are attached to
    /// the command as part of registration.
    pub fn register_command(&mut self, parent: NodeId, name_tokens: &str) -> Result<NodeId> {
        let mut tokens = name_tokens.split_whitespace().peekable();
        let mut current = parent;
        while let Some(token) = tokens.next() {
            if tokens.peek().is_some() {
                current = self.category(current, token);
                continue;
            }
            let node = match self.find_child(current, token) {
                Some(existing) => existing,
                None => self.push_node(current, token),
            };
            if self.node(node).command.is_some() {
                return Err(StratusError::DuplicateCommand(self.full_name(node)));
            }
            for spec in UNIVERSAL_OPTIONS.iter() {
                self.node_mut(node).options.push(spec.clone());
            }
            self.node_mut(node).command = Some(CommandData {
                positionals: Vec::new(),
                detailed_description: None,
                handler: None,
            });
            return Ok(node);
        }
        Err(StratusError::DuplicateCommand(String::from(
            "(empty command name)",
        )))
    }

    /// Appends an option spec to a node (category or command).
    ///
    /// Fails with [`StratusError::DuplicateOption`] if the long flag is
    /// already declared on the same node. Collisions with ancestors or
    /// sibling subtrees are allowed; the parser resolves those by context.
    pub fn add_option(&mut self, node: NodeId, spec: OptionSpec) -> Result<()> {
        if self
            .node(node)
            .options
            .iter()
            .any(|existing| existing.long == spec.long)
        {
            return Err(StratusError::DuplicateOption {
                long: spec.long,
                node: self.full_name(node),
            });
        }
        self.node_mut(node).options.push(spec);
        Ok(())
    }

    pub fn set_description(&mut self, node: NodeId, description: impl Into<String>) {
        self.node_mut(node).description = description.into();
    }

    pub fn set_detailed_description(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(data) = self.node_mut(node).command.as_mut() {
            data.detailed_description = Some(text.into());
        }
    }

    pub fn add_positional(&mut self, node: NodeId, name: impl Into<String>, required: bool) {
        if let Some(data) = self.node_mut(node).command.as_mut() {
            data.positionals.push(PositionalSpec {
                name: name.into(),
                required,
            });
        }
    }

    pub fn set_handler(&mut self, node: NodeId, handler: Handler) {
        if let Some(data) = self.node_mut(node).command.as_mut() {
            data.handler = Some(handler);
        }
    }

    /// Space-joined path from the root to `node`, excluding the root itself.
    pub fn full_name(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id);
            if n.parent.is_some() {
                parts.push(n.name.as_str());
            }
            current = n.parent;
        }
        parts.reverse();
        parts.join(" ")
    }

    pub fn name(&self, node: NodeId) -> &str {
        &self.node(node).name
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    pub fn description(&self, node: NodeId) -> &str {
        &self.node(node).description
    }

    pub fn options(&self, node: NodeId) -> &[OptionSpec] {
        &self.node(node).options
    }

    pub fn is_command(&self, node: NodeId) -> bool {
        self.node(node).command.is_some()
    }

    pub fn command_data(&self, node: NodeId) -> Option<&CommandData> {
        self.node(node).command.as_ref()
    }

    pub fn handler(&self, node: NodeId) -> Option<&Handler> {
        self.node(node).command.as_ref()?.handler.as_ref()
    }

    pub fn find_child(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.node(node)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).name == name)
    }

    /// Children in registration order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(node).children.iter().copied()
    }

    /// Finds the option spec for `token` declared directly on `node`.
    pub fn option_on(&self, node: NodeId, token: &str) -> Option<&OptionSpec> {
        self.node(node).options.iter().find(|spec| spec.matches(token))
    }

    /// Descends from `start` consuming as many of `tokens` as validly name a
    /// child chain. Returns the deepest node reached and the number of
    /// tokens consumed. Descent is greedy: a token naming a child is always
    /// taken as a path segment.
    pub fn descend(&self, start: NodeId, tokens: &[String]) -> (NodeId, usize) {
        let mut current = start;
        let mut consumed = 0;
        for token in tokens {
            match self.find_child(current, token) {
                Some(child) => {
                    current = child;
                    consumed += 1;
                }
                None => break,
            }
        }
        (current, consumed)
    }

    fn push_node(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent: Some(parent),
            description: String::new(),
            options: Vec::new(),
            children: Vec::new(),
            command: None,
        });
        self.node_mut(parent).children.push(id);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
