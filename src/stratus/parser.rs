//! # Tokenizer / Parser
//!
//! Splits a raw argument vector into path segments, positional arguments,
//! and option values, resolving each flag token against the correct nesting
//! level of the command tree.
//!
//! The scan is a single left-to-right pass with one token of lookahead. The
//! difficulty is that a flag may legally appear *before* the full command
//! path is known (`site --location "West US" create --git`), so a flag token
//! is resolved against the deepest tree node reached so far, then against
//! its ancestors, and finally against the universal option table. Flags are
//! never resolved against children not yet visited.
//!
//! ## Unknown-flag heuristic
//!
//! A flag token that resolves nowhere is recorded in
//! [`ParseResult::unknown`]. Because its arg mode cannot be determined, the
//! parser assumes "optional": the following token is consumed as a presumed
//! argument when it does not itself look like a flag, and both tokens land
//! in `unknown` so an outer layer can reinterpret the pair. This is a
//! heuristic, not a guarantee — it can swallow a legitimate positional
//! argument that merely happens not to start with `-`.

use crate::error::{Result, StratusError};
use crate::options::{universal_for, ArgMode, OptionSpec, OptionValues};
use crate::tree::{CommandTree, NodeId};

/// Outcome of one parse. Created fresh per invocation and discarded after
/// dispatch; the tree itself is never mutated by parsing.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Resolved path segments and positional arguments, in argv order.
    pub positional: Vec<String>,
    /// Values keyed by long flag name.
    pub options: OptionValues,
    /// Flag-like tokens (and their presumed arguments) that matched no
    /// option spec at any resolvable level.
    pub unknown: Vec<String>,
}

/// Parses `argv` against `tree`.
pub fn parse(tree: &CommandTree, argv: &[String]) -> Result<ParseResult> {
    parse_with_observer(tree, argv, &mut |_| {})
}

/// Like [`parse`], additionally invoking `observer` with the long name of
/// every boolean flag the moment it is seen, before the scan finishes.
/// Hosts use this to raise log verbosity as soon as `-v` appears rather
/// than after the full argument vector is consumed.
pub fn parse_with_observer(
    tree: &CommandTree,
    argv: &[String],
    observer: &mut dyn FnMut(&str),
) -> Result<ParseResult> {
    let mut result = ParseResult::default();
    let mut current = tree.root();
    let mut path_open = true;
    let mut literal = false;

    let mut i = 0;
    while i < argv.len() {
        let token = &argv[i];
        i += 1;

        if literal {
            result.positional.push(token.clone());
            continue;
        }

        if token == "--" {
            // Everything after the terminator is a literal argument, never
            // a path segment or a flag.
            literal = true;
            path_open = false;
            continue;
        }

        if is_flag_like(token) {
            match resolve_flag(tree, current, token) {
                Some(spec) => {
                    let spec = spec.clone();
                    i = consume_flag(&spec, argv, i, &mut result, observer)?;
                }
                None => {
                    result.unknown.push(token.clone());
                    if let Some(next) = argv.get(i) {
                        if !is_flag_like(next) {
                            result.unknown.push(next.clone());
                            i += 1;
                        }
                    }
                }
            }
            continue;
        }

        result.positional.push(token.clone());
        if path_open {
            match tree.find_child(current, token) {
                Some(child) => current = child,
                // First non-matching positional ends path resolution for
                // good; later tokens are command arguments even if they
                // happen to name a node.
                None => path_open = false,
            }
        }
    }

    Ok(result)
}

/// Whether a token is interpreted as a flag. A lone `-` is a positional by
/// convention (stdin placeholder).
fn is_flag_like(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

/// Resolves a flag token against the deepest node reached so far, then its
/// ancestors toward the root, then the universal option table.
fn resolve_flag<'t>(
    tree: &'t CommandTree,
    deepest: NodeId,
    token: &str,
) -> Option<&'t OptionSpec> {
    let mut node = Some(deepest);
    while let Some(id) = node {
        if let Some(spec) = tree.option_on(id, token) {
            return Some(spec);
        }
        node = tree.parent(id);
    }
    universal_for(token)
}

/// Applies the arg-mode rules for a resolved flag, returning the index of
/// the next unconsumed token.
fn consume_flag(
    spec: &OptionSpec,
    argv: &[String],
    next: usize,
    result: &mut ParseResult,
    observer: &mut dyn FnMut(&str),
) -> Result<usize> {
    match spec.arg {
        ArgMode::None => {
            result.options.record_switch(&spec.long);
            observer(&spec.long);
            Ok(next)
        }
        ArgMode::Required => match argv.get(next) {
            Some(value) if !is_flag_like(value) => {
                result.options.record_value(&spec.long, value.clone());
                Ok(next + 1)
            }
            _ => Err(StratusError::MissingArgument {
                flag: format!("--{}", spec.long),
            }),
        },
        ArgMode::Optional => match argv.get(next) {
            Some(value) if !is_flag_like(value) => {
                result.options.record_value(&spec.long, value.clone());
                Ok(next + 1)
            }
            _ => {
                result.options.record_empty(&spec.long);
                Ok(next)
            }
        },
    }
}
