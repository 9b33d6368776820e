//! # Dispatcher
//!
//! Walks the command tree along the parsed path, descending through
//! categories until a command is selected, invokes its handler, and funnels
//! the handler's completion callback through uniform post-processing: one
//! log line, optional error-log persistence, and a process exit status.
//!
//! The dispatcher never calls `std::process::exit`; it returns the status
//! and leaves process teardown to the binary.

use crate::error::{HandlerError, StratusError};
use crate::help::HelpEngine;
use crate::options::OptionValues;
use crate::output::{Level, OutputSink};
use crate::parser::ParseResult;
use crate::tree::{CommandTree, NodeId};
use chrono::Utc;
use std::cell::{Cell, RefCell};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Once;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Everything a handler receives for one command execution.
pub struct Invocation<'a> {
    /// Full space-joined command name, e.g. `site create`.
    pub command: String,
    /// Positional arguments after the path segments, in argv order.
    pub args: &'a [String],
    pub options: &'a OptionValues,
    /// Flag-like tokens nothing in the tree recognized, passed through for
    /// outer layers (e.g. a wrapped SDK) to interpret.
    pub unknown: &'a [String],
    pub sink: &'a OutputSink,
}

#[derive(Debug, Clone)]
enum CompletionState {
    Pending,
    Succeeded,
    Failed(HandlerError),
}

/// Completion handle given to a handler. Cloneable so a handler can thread
/// it through callbacks; only the first `succeed`/`fail` call counts, every
/// later call is ignored rather than rewriting the outcome.
#[derive(Clone)]
pub struct Completion {
    state: Rc<RefCell<CompletionState>>,
}

impl Completion {
    fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(CompletionState::Pending)),
        }
    }

    pub fn succeed(&self) {
        self.settle(CompletionState::Succeeded);
    }

    pub fn fail(&self, error: HandlerError) {
        self.settle(CompletionState::Failed(error));
    }

    fn settle(&self, outcome: CompletionState) {
        let mut state = self.state.borrow_mut();
        if matches!(*state, CompletionState::Pending) {
            *state = outcome;
        }
    }

    fn outcome(&self) -> CompletionState {
        self.state.borrow().clone()
    }
}

pub struct Dispatcher<'a> {
    tree: &'a CommandTree,
    sink: &'a OutputSink,
}

impl<'a> Dispatcher<'a> {
    pub fn new(tree: &'a CommandTree, sink: &'a OutputSink) -> Self {
        Self { tree, sink }
    }

    /// Runs one parsed invocation to completion and returns the exit status.
    pub fn dispatch(&self, parsed: &ParseResult) -> i32 {
        let help = HelpEngine::new(self.tree);
        let (node, consumed) = self.tree.descend(self.tree.root(), &parsed.positional);
        let args = &parsed.positional[consumed..];

        // A help flag anywhere after the (possibly partial) path renders
        // help for the deepest resolved node instead of invoking anything.
        if parsed.options.is_set("help") {
            help.render(node, 0, self.sink);
            return EXIT_SUCCESS;
        }

        if !self.tree.is_command(node) {
            if let Some(token) = args.first() {
                let error = StratusError::UnknownCommand {
                    context: self.context_name(node),
                    token: token.clone(),
                };
                self.sink.error(&error.to_string());
                help.render(node, 0, self.sink);
                return EXIT_FAILURE;
            }
            // Category selected, no command: show what is available.
            help.render(node, 0, self.sink);
            return EXIT_SUCCESS;
        }

        let data = match self.tree.command_data(node) {
            Some(data) => data,
            None => return EXIT_FAILURE,
        };
        let required = data.positionals.iter().filter(|p| p.required).count();
        if args.len() < required {
            let error = StratusError::ArgumentCount {
                command: self.tree.full_name(node),
                expected: required,
                received: args.len(),
            };
            self.sink.error(&error.to_string());
            help.render(node, 0, self.sink);
            return EXIT_FAILURE;
        }

        let handler = match self.tree.handler(node) {
            Some(handler) => handler,
            None => {
                self.sink.error(&format!(
                    "Command '{}' has no registered handler",
                    self.tree.full_name(node)
                ));
                return EXIT_FAILURE;
            }
        };

        let invocation = Invocation {
            command: self.tree.full_name(node),
            args,
            options: &parsed.options,
            unknown: &parsed.unknown,
            sink: self.sink,
        };

        self.sink
            .verbose(&format!("Executing command {}", invocation.command));

        install_panic_boundary();
        let completion = Completion::new();
        let guard = DispatchGuard::enter();
        let unwound = std::panic::catch_unwind(AssertUnwindSafe(|| {
            handler(&invocation, completion.clone());
        }));
        drop(guard);

        let outcome = match unwound {
            Ok(()) => match completion.outcome() {
                CompletionState::Pending => CompletionState::Failed(HandlerError::new(format!(
                    "Command '{}' returned without signaling completion",
                    invocation.command
                ))),
                settled => settled,
            },
            Err(_) => {
                let message = take_panic_message()
                    .unwrap_or_else(|| "command handler panicked".to_string());
                // The panic wins even if the handler had already completed:
                // a crash after completion is still a crash.
                CompletionState::Failed(
                    HandlerError::new(message).with_stack("panic in command handler"),
                )
            }
        };

        self.complete(&invocation.command, outcome)
    }

    /// Uniform completion handling shared by every command.
    fn complete(&self, command: &str, outcome: CompletionState) -> i32 {
        match outcome {
            CompletionState::Pending | CompletionState::Succeeded => {
                self.sink.verbose(&format!("Command {} OK", command));
                EXIT_SUCCESS
            }
            CompletionState::Failed(error) => {
                // Service errors often wrap the real error body one level
                // deep; unwrap exactly once, never recursively.
                let error = match error.inner {
                    Some(inner) => *inner,
                    None => error,
                };
                self.sink.error(&error.message);
                if self.sink.level() >= Level::Verbose {
                    if let Some(stack) = &error.stack {
                        self.sink.raw(stack);
                    }
                    if let Some(details) = &error.details {
                        self.sink.json(details);
                    }
                }
                if error.stack.is_some() || error.details.is_some() {
                    match persist_error(command, &error) {
                        Ok(path) => self
                            .sink
                            .verbose(&format!("Error details written to {}", path.display())),
                        Err(io) => self
                            .sink
                            .verbose(&format!("Could not write error log: {}", io)),
                    }
                }
                EXIT_FAILURE
            }
        }
    }

    fn context_name(&self, node: NodeId) -> String {
        let full = self.tree.full_name(node);
        if full.is_empty() {
            env!("CARGO_PKG_NAME").to_string()
        } else {
            format!("{} {}", env!("CARGO_PKG_NAME"), full)
        }
    }
}

/// Appends full error detail to the local error-log file and returns its
/// path. The location is the platform data directory, overridable through
/// `STRATUS_ERR_DIR`.
fn persist_error(command: &str, error: &HandlerError) -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("STRATUS_ERR_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => directories::ProjectDirs::from("com", "stratus", "stratus")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.err", env!("CARGO_PKG_NAME")));

    let entry = serde_json::json!({
        "timestamp": Utc::now().to_rfc3339(),
        "command": command,
        "message": error.message,
        "stack": error.stack,
        "details": error.details,
    });
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    use std::io::Write;
    writeln!(file, "{}", entry)?;
    Ok(path)
}

static PANIC_BOUNDARY: Once = Once::new();

thread_local! {
    static IN_DISPATCH: Cell<bool> = const { Cell::new(false) };
    static PANIC_MESSAGE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// RAII marker for "a handler is running on this thread", so the panic hook
/// knows when to capture instead of printing.
struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Self {
        IN_DISPATCH.with(|flag| flag.set(true));
        Self
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        IN_DISPATCH.with(|flag| flag.set(false));
    }
}

/// Installs the process-wide panic boundary. Installed once per process no
/// matter how many dispatches run (test harnesses dispatch many times);
/// outside handler execution the previous hook keeps full control.
fn install_panic_boundary() {
    PANIC_BOUNDARY.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if IN_DISPATCH.with(|flag| flag.get()) {
                let message = info
                    .payload()
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| info.payload().downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "command handler panicked".to_string());
                PANIC_MESSAGE.with(|slot| *slot.borrow_mut() = Some(message));
            } else {
                previous(info);
            }
        }));
    });
}

fn take_panic_message() -> Option<String> {
    PANIC_MESSAGE.with(|slot| slot.borrow_mut().take())
}
