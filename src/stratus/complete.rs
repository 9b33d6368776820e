//! # Autocomplete Engine
//!
//! Replays the dispatcher's tree walk over the tokens typed so far and
//! returns candidate completions instead of invoking anything. Pure
//! function of the tree and the input tokens: no side effects, no tree
//! mutation, repeatable.

use crate::tree::{CommandTree, NodeId};

/// Candidate completions for a partially typed command line, already split
/// into tokens with the program name discarded.
pub fn candidates(tree: &CommandTree, tokens: &[String]) -> Vec<String> {
    let mut node = tree.root();
    for (i, token) in tokens.iter().enumerate() {
        if let Some(child) = tree.find_child(node, token) {
            node = child;
            continue;
        }
        if i + 1 == tokens.len() {
            return partial_matches(tree, node, token);
        }
        // A mid-line token that matches nothing: no sensible completion.
        return Vec::new();
    }

    // All tokens consumed exactly: offer everything available here.
    let mut out: Vec<String> = tree
        .children(node)
        .map(|child| tree.name(child).to_string())
        .collect();
    if tree.is_command(node) {
        out.extend(long_flags(tree, node));
    }
    out
}

/// Completions for the full typed line, program name included. A trailing
/// space means the last word is complete and a fresh token is being
/// started.
pub fn complete_line(tree: &CommandTree, line: &str) -> Vec<String> {
    let tokens: Vec<String> = line
        .split_whitespace()
        .skip(1)
        .map(|s| s.to_string())
        .collect();
    candidates(tree, &tokens)
}

/// Sibling names (or long flags) matching a partial last token, excluding
/// an exact match of the token itself.
fn partial_matches(tree: &CommandTree, node: NodeId, partial: &str) -> Vec<String> {
    if partial.starts_with("--") && tree.is_command(node) {
        return long_flags(tree, node)
            .into_iter()
            .filter(|flag| flag.starts_with(partial) && flag != partial)
            .collect();
    }
    tree.children(node)
        .map(|child| tree.name(child).to_string())
        .filter(|name| name.starts_with(partial) && name != partial)
        .collect()
}

fn long_flags(tree: &CommandTree, node: NodeId) -> Vec<String> {
    tree.options(node)
        .iter()
        .map(|spec| format!("--{}", spec.long))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ArgMode, OptionSpec};
    use crate::tree::CommandTree;

    fn vm_tree() -> CommandTree {
        let mut tree = CommandTree::new();
        let vm = tree.category(tree.root(), "vm");
        for name in ["create", "connect", "capture", "shutdown"] {
            tree.register_command(vm, name).unwrap();
        }
        let create = tree.find_child(vm, "create").unwrap();
        tree.add_option(
            create,
            OptionSpec::new(None, "location", ArgMode::Required, ""),
        )
        .unwrap();
        tree
    }

    fn strs(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn category_with_no_more_tokens_lists_all_children() {
        let tree = vm_tree();
        let got = candidates(&tree, &strs(&["vm"]));
        assert_eq!(got, vec!["create", "connect", "capture", "shutdown"]);
    }

    #[test]
    fn partial_token_filters_siblings_by_prefix() {
        let tree = vm_tree();
        assert_eq!(
            candidates(&tree, &strs(&["vm", "c"])),
            vec!["create", "connect", "capture"]
        );
        assert_eq!(candidates(&tree, &strs(&["vm", "co"])), vec!["connect"]);
    }

    #[test]
    fn exact_match_descends_instead_of_echoing_itself() {
        let tree = vm_tree();
        let got = candidates(&tree, &strs(&["vm", "create"]));
        assert!(got.contains(&"--location".to_string()));
        assert!(got.contains(&"--json".to_string()));
        assert!(!got.contains(&"create".to_string()));
    }

    #[test]
    fn unmatched_mid_line_token_yields_nothing() {
        let tree = vm_tree();
        assert!(candidates(&tree, &strs(&["vm", "bogus", "x"])).is_empty());
    }

    #[test]
    fn partial_flag_completion_at_a_command() {
        let tree = vm_tree();
        assert_eq!(
            candidates(&tree, &strs(&["vm", "create", "--loc"])),
            vec!["--location"]
        );
        // The exact flag is not offered back.
        assert!(candidates(&tree, &strs(&["vm", "create", "--location"])).is_empty());
    }

    #[test]
    fn complete_line_discards_the_program_name() {
        let tree = vm_tree();
        assert_eq!(
            complete_line(&tree, "stratus vm co"),
            vec!["connect"]
        );
        assert_eq!(
            complete_line(&tree, "stratus vm "),
            vec!["create", "connect", "capture", "shutdown"]
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let tree = vm_tree();
        let first = candidates(&tree, &strs(&["vm", "c"]));
        let second = candidates(&tree, &strs(&["vm", "c"]));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_lists_root_children() {
        let tree = vm_tree();
        assert_eq!(candidates(&tree, &[]), vec!["vm"]);
    }
}
