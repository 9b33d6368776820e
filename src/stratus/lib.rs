//! # Stratus Architecture
//!
//! Stratus is a **UI-agnostic command-tree dispatcher**. This is not a CLI
//! application that happens to have some library code. It is a library for
//! building hierarchical CLIs (`tool category subcategory command --flags`)
//! that happens to ship a thin binary host.
//!
//! ## The Flow of One Invocation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host (main.rs)                                             │
//! │  - Assembles the plugin manifest, builds the OutputSink     │
//! │  - The ONLY place that calls std::process::exit             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Facade (api.rs)                                        │
//! │  - Builds the tree from the manifest (plugin.rs)            │
//! │  - run(argv) = parse → derive format → dispatch             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Parser (parser.rs)                                         │
//! │  - Single pass, one token lookahead                         │
//! │  - Resolves flags against the correct tree nesting level    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Dispatcher (dispatch.rs)                                   │
//! │  - Descends the tree, invokes the handler                   │
//! │  - Uniform completion: at-most-once, exit status, err log   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The help engine (`help.rs`) and autocomplete engine (`complete.rs`) walk
//! the same tree read-only; neither the parser nor any engine ever mutates
//! it, so one tree serves arbitrarily many invocations in one process.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code:
//! - Takes regular Rust function arguments
//! - Returns regular Rust types (`Result<T>`, exit status integers)
//! - **Never** writes to stdout/stderr directly — all output flows through
//!   an injected [`output::OutputSink`]
//! - **Never** calls `std::process::exit`
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, entry point for hosting a command tree
//! - [`tree`]: The arena-backed command tree and registration primitives
//! - [`options`]: Option specs, parsed values, the universal option table
//! - [`parser`]: The tokenizer/parser state machine
//! - [`dispatch`]: Tree descent, handler invocation, uniform completion
//! - [`help`]: Text and JSON help rendering
//! - [`complete`]: Pure autocomplete walk and shell integration
//! - [`plugin`]: Plugin trait and fluent registration handles
//! - [`output`]: The injected output sink (levels, json mode, tables)
//! - [`error`]: Error types

pub mod api;
pub mod complete;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod options;
pub mod output;
pub mod parser;
pub mod plugin;
pub mod tree;
