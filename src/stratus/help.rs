//! # Help Engine
//!
//! Renders human-readable help for any tree node, and a machine-readable
//! JSON mirror of the same structure. The JSON shape is a stable consumer
//! contract (IDE integration, docs generators):
//!
//! ```text
//! {categories: {name: <same shape>}, commands: [{name, description, options, usage}]}
//! ```

use crate::options::OptionSpec;
use crate::output::OutputSink;
use crate::tree::{CommandTree, NodeId};
use serde::Serialize;
use std::collections::BTreeMap;
use unicode_width::UnicodeWidthStr;

#[derive(Serialize)]
struct CommandHelp {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detailed_description: Option<String>,
    options: Vec<OptionSpec>,
    usage: String,
}

#[derive(Serialize)]
struct CategoryHelp {
    name: String,
    description: String,
    categories: BTreeMap<String, CategoryHelp>,
    commands: Vec<CommandHelp>,
}

pub struct HelpEngine<'a> {
    tree: &'a CommandTree,
}

impl<'a> HelpEngine<'a> {
    pub fn new(tree: &'a CommandTree) -> Self {
        Self { tree }
    }

    /// Renders help for `node`. For categories, `depth` limits recursion
    /// into subcategories: `0` lists immediate children only, `-1` is
    /// unlimited.
    pub fn render(&self, node: NodeId, depth: i32, sink: &OutputSink) {
        if self.tree.is_command(node) {
            self.render_command(node, sink);
        } else {
            self.render_category(node, depth, sink);
        }
    }

    /// Usage line for any node.
    pub fn usage(&self, node: NodeId) -> String {
        let program = env!("CARGO_PKG_NAME");
        let full = self.tree.full_name(node);
        let mut usage = if full.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, full)
        };
        if let Some(data) = self.tree.command_data(node) {
            usage.push_str(" [options]");
            for positional in &data.positionals {
                if positional.required {
                    usage.push_str(&format!(" <{}>", positional.name));
                } else {
                    usage.push_str(&format!(" [{}]", positional.name));
                }
            }
        } else {
            usage.push_str(" <command>");
        }
        usage
    }

    /// JSON help for `node`, lossless with respect to names, descriptions,
    /// option long flags, and usage strings.
    pub fn help_json(&self, node: NodeId) -> serde_json::Value {
        if self.tree.is_command(node) {
            serde_json::to_value(self.command_help(node)).unwrap_or(serde_json::Value::Null)
        } else {
            serde_json::to_value(self.category_help(node)).unwrap_or(serde_json::Value::Null)
        }
    }

    fn command_help(&self, node: NodeId) -> CommandHelp {
        let data = self.tree.command_data(node);
        CommandHelp {
            name: self.tree.name(node).to_string(),
            description: self.tree.description(node).to_string(),
            detailed_description: data.and_then(|d| d.detailed_description.clone()),
            options: self.tree.options(node).to_vec(),
            usage: self.usage(node),
        }
    }

    fn category_help(&self, node: NodeId) -> CategoryHelp {
        let mut categories = BTreeMap::new();
        let mut commands = Vec::new();
        for child in self.tree.children(node) {
            if self.tree.is_command(child) {
                commands.push(self.command_help(child));
            }
            if self.is_category_like(child) {
                categories.insert(
                    self.tree.name(child).to_string(),
                    self.category_help(child),
                );
            }
        }
        CategoryHelp {
            name: self.tree.name(node).to_string(),
            description: self.tree.description(node).to_string(),
            categories,
            commands,
        }
    }

    fn render_command(&self, node: NodeId, sink: &OutputSink) {
        let description = self.tree.description(node);
        if !description.is_empty() {
            sink.raw(description);
            sink.raw("");
        }
        if let Some(detail) = self
            .tree
            .command_data(node)
            .and_then(|d| d.detailed_description.as_deref())
        {
            sink.raw(detail);
            sink.raw("");
        }
        sink.raw(&format!("Usage: {}", self.usage(node)));

        let options = self.tree.options(node);
        if !options.is_empty() {
            sink.raw("");
            sink.raw("Options:");
            let width = options
                .iter()
                .map(|spec| spec.usage().width())
                .max()
                .unwrap_or(0);
            for spec in options {
                let flag = spec.usage();
                let pad = width - flag.width();
                sink.raw(&format!("  {}{}  {}", flag, " ".repeat(pad), spec.description));
            }
        }
    }

    fn render_category(&self, node: NodeId, depth: i32, sink: &OutputSink) {
        let description = self.tree.description(node);
        if !description.is_empty() {
            sink.raw(description);
            sink.raw("");
        }
        sink.raw(&format!("Usage: {}", self.usage(node)));

        let mut commands = Vec::new();
        self.collect_commands(node, depth, "", &mut commands);
        if !commands.is_empty() {
            sink.raw("");
            sink.raw("Commands:");
            self.two_columns(&commands, sink);
        }

        let categories: Vec<(String, String)> = self
            .tree
            .children(node)
            .filter(|&child| self.is_category_like(child))
            .map(|child| {
                (
                    self.tree.name(child).to_string(),
                    self.tree.description(child).to_string(),
                )
            })
            .collect();
        if !categories.is_empty() {
            sink.raw("");
            sink.raw("Categories:");
            self.two_columns(&categories, sink);
        }
    }

    /// Command rows under `node`, names shown relative to it. Recursion
    /// stops when `depth` reaches zero; negative means unlimited.
    fn collect_commands(
        &self,
        node: NodeId,
        depth: i32,
        prefix: &str,
        out: &mut Vec<(String, String)>,
    ) {
        for child in self.tree.children(node) {
            let name = if prefix.is_empty() {
                self.tree.name(child).to_string()
            } else {
                format!("{} {}", prefix, self.tree.name(child))
            };
            if self.tree.is_command(child) {
                out.push((name.clone(), self.tree.description(child).to_string()));
            }
            if depth != 0 {
                let next = if depth > 0 { depth - 1 } else { depth };
                self.collect_commands(child, next, &name, out);
            }
        }
    }

    fn two_columns(&self, rows: &[(String, String)], sink: &OutputSink) {
        let width = rows.iter().map(|(name, _)| name.width()).max().unwrap_or(0);
        for (name, description) in rows {
            let pad = width - name.width();
            sink.raw(&format!("  {}{}  {}", name, " ".repeat(pad), description));
        }
    }

    /// Whether a node should be listed as a category: anything with
    /// children, or anything that is not itself a command.
    fn is_category_like(&self, node: NodeId) -> bool {
        self.tree.children(node).next().is_some() || !self.tree.is_command(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ArgMode, OptionSpec};
    use crate::output::{Format, OutputSink};
    use crate::tree::CommandTree;

    fn sample_tree() -> CommandTree {
        let mut tree = CommandTree::new();
        let site = tree.category(tree.root(), "site");
        tree.set_description(site, "Commands to manage web sites");
        let create = tree.register_command(site, "create").unwrap();
        tree.set_description(create, "Create a new web site");
        tree.add_positional(create, "name", true);
        tree.add_positional(create, "slot", false);
        tree.add_option(
            create,
            OptionSpec::new(None, "git", ArgMode::None, "configure git deployment"),
        )
        .unwrap();
        tree.add_option(
            create,
            OptionSpec::new(
                Some('l'),
                "location",
                ArgMode::Required,
                "the geographic region",
            ),
        )
        .unwrap();
        tree
    }

    #[test]
    fn command_usage_mentions_every_required_positional() {
        let tree = sample_tree();
        let site = tree.find_child(tree.root(), "site").unwrap();
        let create = tree.find_child(site, "create").unwrap();
        let usage = HelpEngine::new(&tree).usage(create);
        assert_eq!(usage, "stratus site create [options] <name> [slot]");
    }

    #[test]
    fn help_json_lists_each_long_flag_exactly_once() {
        let tree = sample_tree();
        let site = tree.find_child(tree.root(), "site").unwrap();
        let create = tree.find_child(site, "create").unwrap();
        let json = HelpEngine::new(&tree).help_json(create);

        let options = json["options"].as_array().unwrap();
        let longs: Vec<&str> = options
            .iter()
            .map(|o| o["long"].as_str().unwrap())
            .collect();
        for long in ["git", "location", "verbose", "json", "help"] {
            assert_eq!(
                longs.iter().filter(|&&l| l == long).count(),
                1,
                "flag {} should appear exactly once",
                long
            );
        }
        assert!(json["usage"].as_str().unwrap().contains("<name>"));
    }

    #[test]
    fn category_json_has_the_consumer_shape() {
        let tree = sample_tree();
        let json = HelpEngine::new(&tree).help_json(tree.root());
        let site = &json["categories"]["site"];
        assert_eq!(site["description"], "Commands to manage web sites");
        let commands = site["commands"].as_array().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0]["name"], "create");
        assert_eq!(commands[0]["description"], "Create a new web site");
    }

    #[test]
    fn command_render_shows_options_and_usage() {
        let tree = sample_tree();
        let site = tree.find_child(tree.root(), "site").unwrap();
        let create = tree.find_child(site, "create").unwrap();
        let (sink, out, _err) = OutputSink::memory(Format::default());
        HelpEngine::new(&tree).render(create, 0, &sink);

        let text = out.contents();
        assert!(text.contains("Usage: stratus site create [options] <name> [slot]"));
        assert!(text.contains("--git"));
        assert!(text.contains("-l, --location <location>"));
        assert!(text.contains("--json"));
    }

    #[test]
    fn category_render_lists_children_at_depth_zero() {
        let tree = sample_tree();
        let site = tree.find_child(tree.root(), "site").unwrap();
        let (sink, out, _err) = OutputSink::memory(Format::default());
        HelpEngine::new(&tree).render(site, 0, &sink);

        let text = out.contents();
        assert!(text.contains("Commands to manage web sites"));
        assert!(text.contains("create"));
    }

    #[test]
    fn unlimited_depth_shows_nested_commands_with_full_relative_names() {
        let tree = sample_tree();
        let (sink, out, _err) = OutputSink::memory(Format::default());
        HelpEngine::new(&tree).render(tree.root(), -1, &sink);
        assert!(out.contents().contains("site create"));
    }

    #[test]
    fn depth_zero_hides_nested_commands_at_the_root() {
        let tree = sample_tree();
        let (sink, out, _err) = OutputSink::memory(Format::default());
        HelpEngine::new(&tree).render(tree.root(), 0, &sink);
        let text = out.contents();
        assert!(!text.contains("site create"));
        assert!(text.contains("site"));
    }
}
