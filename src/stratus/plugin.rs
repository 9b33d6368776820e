//! # Plugin Registration
//!
//! Service modules contribute commands through an explicit manifest rather
//! than filesystem discovery: the host assembles a list of [`Plugin`]
//! values at startup and [`build_tree`] calls each one's `init` with a
//! [`CliRoot`] handle. Registration is deterministic (manifest order) and
//! fatal on the first error, since a partially built tree is unsafe to
//! serve.
//!
//! The handles expose the fluent registration surface plugins use:
//!
//! ```
//! use stratus::plugin::{CliRoot, Plugin};
//! use stratus::options::ArgMode;
//! use stratus::error::Result;
//!
//! struct SitePlugin;
//!
//! impl Plugin for SitePlugin {
//!     fn name(&self) -> &str {
//!         "site"
//!     }
//!
//!     fn init(&self, root: &mut CliRoot<'_>) -> Result<()> {
//!         let mut site = root.category("site");
//!         site.describe("Commands to manage web sites");
//!         site.command("create")?
//!             .description("Create a new web site")
//!             .positional("name", true)
//!             .option(None, "git", ArgMode::None, "configure git deployment")?
//!             .execute(|inv, done| {
//!                 inv.sink.info(&format!("creating {}", inv.args[0]));
//!                 done.succeed();
//!             });
//!         Ok(())
//!     }
//! }
//! ```

use crate::dispatch::{Completion, Invocation};
use crate::error::{Result, StratusError};
use crate::options::{ArgMode, OptionSpec};
use crate::tree::{CommandTree, NodeId};

/// One registrable service module.
pub trait Plugin {
    fn name(&self) -> &str;
    fn init(&self, root: &mut CliRoot<'_>) -> Result<()>;
}

/// Builds the command tree from an explicit plugin manifest. The first
/// registration error aborts the whole build.
pub fn build_tree(plugins: &[Box<dyn Plugin>]) -> Result<CommandTree> {
    let mut tree = CommandTree::new();
    for plugin in plugins {
        let mut root = CliRoot { tree: &mut tree };
        plugin.init(&mut root).map_err(|source| StratusError::Plugin {
            plugin: plugin.name().to_string(),
            source: Box::new(source),
        })?;
    }
    Ok(tree)
}

/// Registration handle for the synthetic root.
pub struct CliRoot<'t> {
    tree: &'t mut CommandTree,
}

impl<'t> CliRoot<'t> {
    pub fn new(tree: &'t mut CommandTree) -> Self {
        Self { tree }
    }

    /// Looks up or creates a top-level category. Idempotent, so several
    /// plugins may extend the same category.
    pub fn category(&mut self, name: &str) -> CategoryHandle<'_> {
        let id = self.tree.category(self.tree.root(), name);
        CategoryHandle {
            tree: self.tree,
            id,
        }
    }

    /// Registers a command directly under the root.
    pub fn command(&mut self, name_tokens: &str) -> Result<CommandHandle<'_>> {
        let id = self.tree.register_command(self.tree.root(), name_tokens)?;
        Ok(CommandHandle {
            tree: self.tree,
            id,
        })
    }
}

/// Registration handle for a category node.
pub struct CategoryHandle<'t> {
    tree: &'t mut CommandTree,
    id: NodeId,
}

impl<'t> CategoryHandle<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn describe(&mut self, description: &str) -> &mut Self {
        self.tree.set_description(self.id, description);
        self
    }

    /// Declares a category-level option, resolvable by any descendant
    /// invocation once this category is on the path.
    pub fn option(
        &mut self,
        short: Option<char>,
        long: &str,
        arg: ArgMode,
        description: &str,
    ) -> Result<&mut Self> {
        self.tree
            .add_option(self.id, OptionSpec::new(short, long, arg, description))?;
        Ok(self)
    }

    /// Looks up or creates a child category.
    pub fn category(&mut self, name: &str) -> CategoryHandle<'_> {
        let id = self.tree.category(self.id, name);
        CategoryHandle {
            tree: self.tree,
            id,
        }
    }

    /// Registers a command beneath this category; `name_tokens` may be a
    /// space-separated path that creates intermediate categories.
    pub fn command(&mut self, name_tokens: &str) -> Result<CommandHandle<'_>> {
        let id = self.tree.register_command(self.id, name_tokens)?;
        Ok(CommandHandle {
            tree: self.tree,
            id,
        })
    }
}

/// Registration handle for a command node. Consumed by [`execute`], which
/// binds the handler and finishes the registration.
///
/// [`execute`]: CommandHandle::execute
pub struct CommandHandle<'t> {
    tree: &'t mut CommandTree,
    id: NodeId,
}

impl<'t> CommandHandle<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn description(self, description: &str) -> Self {
        self.tree.set_description(self.id, description);
        self
    }

    pub fn detailed_description(self, text: &str) -> Self {
        self.tree.set_detailed_description(self.id, text);
        self
    }

    /// Declares an expected positional argument, in order.
    pub fn positional(self, name: &str, required: bool) -> Self {
        self.tree.add_positional(self.id, name, required);
        self
    }

    pub fn option(
        self,
        short: Option<char>,
        long: &str,
        arg: ArgMode,
        description: &str,
    ) -> Result<Self> {
        self.tree
            .add_option(self.id, OptionSpec::new(short, long, arg, description))?;
        Ok(self)
    }

    /// Binds the handler, completing the command registration.
    pub fn execute<F>(self, handler: F) -> NodeId
    where
        F: Fn(&Invocation<'_>, Completion) + 'static,
    {
        self.tree.set_handler(self.id, Box::new(handler));
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StoragePlugin;

    impl Plugin for StoragePlugin {
        fn name(&self) -> &str {
            "storage"
        }

        fn init(&self, root: &mut CliRoot<'_>) -> Result<()> {
            let mut storage = root.category("storage");
            storage.describe("Commands to manage storage accounts");
            storage
                .command("account list")?
                .description("List storage accounts")
                .execute(|_inv, done| done.succeed());
            Ok(())
        }
    }

    struct StorageKeysPlugin;

    impl Plugin for StorageKeysPlugin {
        fn name(&self) -> &str {
            "storage-keys"
        }

        fn init(&self, root: &mut CliRoot<'_>) -> Result<()> {
            // Extends the category the other plugin created.
            root.category("storage")
                .command("account keys list")?
                .description("List storage account keys")
                .positional("account", true)
                .execute(|_inv, done| done.succeed());
            Ok(())
        }
    }

    struct BrokenPlugin;

    impl Plugin for BrokenPlugin {
        fn name(&self) -> &str {
            "broken"
        }

        fn init(&self, root: &mut CliRoot<'_>) -> Result<()> {
            root.category("storage")
                .command("account list")?
                .execute(|_inv, done| done.succeed());
            Ok(())
        }
    }

    #[test]
    fn plugins_extend_a_shared_category() {
        let plugins: Vec<Box<dyn Plugin>> =
            vec![Box::new(StoragePlugin), Box::new(StorageKeysPlugin)];
        let tree = build_tree(&plugins).unwrap();

        let storage = tree.find_child(tree.root(), "storage").unwrap();
        let account = tree.find_child(storage, "account").unwrap();
        assert!(tree.find_child(account, "list").is_some());
        let keys = tree.find_child(account, "keys").unwrap();
        let keys_list = tree.find_child(keys, "list").unwrap();
        assert_eq!(tree.full_name(keys_list), "storage account keys list");
    }

    #[test]
    fn duplicate_registration_is_fatal_and_names_the_plugin() {
        let plugins: Vec<Box<dyn Plugin>> =
            vec![Box::new(StoragePlugin), Box::new(BrokenPlugin)];
        let err = build_tree(&plugins).unwrap_err();
        match err {
            StratusError::Plugin { plugin, source } => {
                assert_eq!(plugin, "broken");
                assert!(matches!(*source, StratusError::DuplicateCommand(_)));
            }
            other => panic!("expected plugin error, got {other}"),
        }
    }
}
