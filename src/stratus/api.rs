//! # API Facade
//!
//! [`StratusCli`] is the single entry point for hosting the command tree:
//! build it from a plugin manifest, then drive one invocation per process
//! (or many, in tests — the tree is read-only after construction and safe
//! to reuse across repeated runs).
//!
//! The facade never exits the process. [`StratusCli::run`] returns the exit
//! status and leaves `std::process::exit` to the binary.

use crate::complete;
use crate::dispatch::{Dispatcher, EXIT_FAILURE, EXIT_SUCCESS};
use crate::error::Result;
use crate::help::HelpEngine;
use crate::options::OptionValues;
use crate::output::{Format, Level, OutputSink};
use crate::parser::{self, ParseResult};
use crate::plugin::{build_tree, Plugin};
use crate::tree::CommandTree;

/// Invocation prefix selecting the shell-integration completion mode:
/// `stratus --compgen <fragment> <word> <line...>` prints newline-separated
/// candidates for the typed line and exits.
pub const COMPGEN_FLAG: &str = "--compgen";

pub struct StratusCli {
    tree: CommandTree,
}

impl StratusCli {
    /// Builds the command tree from an explicit plugin manifest. Any
    /// registration error is fatal: a partial tree is never served.
    pub fn from_plugins(plugins: &[Box<dyn Plugin>]) -> Result<Self> {
        Ok(Self {
            tree: build_tree(plugins)?,
        })
    }

    /// Wraps an already-built tree (used by tests and embedders).
    pub fn from_tree(tree: CommandTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn parse(&self, argv: &[String]) -> Result<ParseResult> {
        parser::parse(&self.tree, argv)
    }

    /// Candidate completions for a full typed line (program name included).
    pub fn complete(&self, line: &str) -> Vec<String> {
        complete::complete_line(&self.tree, line)
    }

    /// Machine-readable help for the whole tree.
    pub fn help_json(&self) -> serde_json::Value {
        HelpEngine::new(&self.tree).help_json(self.tree.root())
    }

    /// Runs one invocation: parses, derives the output format from the
    /// captured `--json`/`--verbose` values, builds the sink through
    /// `make_sink`, and dispatches. Returns the process exit status.
    pub fn run<F>(&self, argv: &[String], make_sink: F) -> i32
    where
        F: FnOnce(Format) -> OutputSink,
    {
        if argv.first().map(String::as_str) == Some(COMPGEN_FLAG) {
            // fragment and word are positional by contract but only the
            // line is needed to replay the walk.
            let line = argv.get(3..).unwrap_or(&[]).join(" ");
            let sink = make_sink(Format::default());
            for candidate in self.complete(&line) {
                sink.raw(&candidate);
            }
            return EXIT_SUCCESS;
        }

        let parsed = match self.parse(argv) {
            Ok(parsed) => parsed,
            Err(error) => {
                let sink = make_sink(Format::default());
                sink.error(&error.to_string());
                return EXIT_FAILURE;
            }
        };

        let sink = make_sink(format_from(&parsed.options));
        Dispatcher::new(&self.tree, &sink).dispatch(&parsed)
    }
}

fn format_from(options: &OptionValues) -> Format {
    Format {
        json: options.is_set("json"),
        level: Level::from_verbose_count(options.count("verbose")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::output::SharedBuffer;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    fn demo_cli() -> StratusCli {
        let mut tree = CommandTree::new();
        let site = tree.category(tree.root(), "site");
        let show = tree.register_command(site, "show").unwrap();
        tree.add_positional(show, "name", true);
        tree.set_handler(
            show,
            Box::new(|inv, done| {
                if inv.options.is_set("json") {
                    inv.sink
                        .json(&serde_json::json!({"site": inv.args[0], "state": "Running"}));
                } else {
                    inv.sink.info(&format!("{} is Running", inv.args[0]));
                }
                done.succeed();
            }),
        );
        StratusCli::from_tree(tree)
    }

    fn run_captured(cli: &StratusCli, tokens: &[&str]) -> (i32, String, String) {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let (out2, err2) = (out.clone(), err.clone());
        let status = cli.run(&argv(tokens), move |format| {
            OutputSink::with_writers(format, Box::new(out2), Box::new(err2))
        });
        (status, out.contents(), err.contents())
    }

    #[test]
    fn run_dispatches_and_reports_success() {
        let cli = demo_cli();
        let (status, out, _err) = run_captured(&cli, &["site", "show", "mysite"]);
        assert_eq!(status, 0);
        assert!(out.contains("mysite is Running"));
    }

    #[test]
    fn json_flag_switches_the_output_format() {
        let cli = demo_cli();
        let (status, out, _err) = run_captured(&cli, &["site", "show", "mysite", "--json"]);
        assert_eq!(status, 0);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["site"], "mysite");
        assert!(!out.contains("is Running"));
    }

    #[test]
    fn parse_errors_exit_nonzero_with_a_message() {
        let mut tree = CommandTree::new();
        let site = tree.category(tree.root(), "site");
        tree.add_option(
            site,
            crate::options::OptionSpec::new(
                None,
                "location",
                crate::options::ArgMode::Required,
                "",
            ),
        )
        .unwrap();
        let cli = StratusCli::from_tree(tree);

        let (status, _out, err) = run_captured(&cli, &["site", "--location"]);
        assert_eq!(status, 1);
        assert!(err.contains("--location"));
    }

    #[test]
    fn handler_error_exits_nonzero() {
        let mut tree = CommandTree::new();
        let cmd = tree.register_command(tree.root(), "boom").unwrap();
        tree.set_handler(
            cmd,
            Box::new(|_inv, done| done.fail(HandlerError::new("it broke"))),
        );
        let cli = StratusCli::from_tree(tree);

        let (status, _out, err) = run_captured(&cli, &["boom"]);
        assert_eq!(status, 1);
        assert!(err.contains("it broke"));
    }

    #[test]
    fn compgen_mode_prints_candidates() {
        let cli = demo_cli();
        let (status, out, _err) =
            run_captured(&cli, &["--compgen", "s", "s", "stratus", "s"]);
        assert_eq!(status, 0);
        assert_eq!(out.trim(), "site");
    }

    #[test]
    fn tree_survives_repeated_invocations() {
        let cli = demo_cli();
        for _ in 0..3 {
            let (status, _out, _err) = run_captured(&cli, &["site", "show", "a"]);
            assert_eq!(status, 0);
        }
        let (status, _out, _err) = run_captured(&cli, &["site", "show", "b", "--json"]);
        assert_eq!(status, 0);
    }

    #[test]
    fn help_json_covers_the_whole_tree() {
        let cli = demo_cli();
        let json = cli.help_json();
        assert!(json["categories"]["site"]["commands"]
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["name"] == "show"));
    }
}
