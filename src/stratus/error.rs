use thiserror::Error;

/// Error supplied by a command handler on failed completion.
///
/// Handlers wrap remote-service failures, which often arrive as a JSON error
/// body nested inside a transport-level error. `inner` carries at most one
/// level of that nesting; the dispatcher unwraps it exactly once during
/// completion handling.
#[derive(Debug, Clone)]
pub struct HandlerError {
    pub message: String,
    /// Stack trace or equivalent detail, shown only in verbose mode and
    /// persisted to the error log.
    pub stack: Option<String>,
    /// Structured payload from the wrapped service, if any.
    pub details: Option<serde_json::Value>,
    /// One level of wrapped error (e.g. a service error body inside a
    /// transport error).
    pub inner: Option<Box<HandlerError>>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
            details: None,
            inner: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn wrapping(mut self, inner: HandlerError) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for HandlerError {}

#[derive(Error, Debug)]
pub enum StratusError {
    #[error("Command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error("Option --{long} is already declared on '{node}'")]
    DuplicateOption { long: String, node: String },

    #[error("Missing expected argument for option {flag}")]
    MissingArgument { flag: String },

    #[error("'{token}' is not a {context} command")]
    UnknownCommand { context: String, token: String },

    #[error("Command '{command}' expects at least {expected} argument(s), got {received}")]
    ArgumentCount {
        command: String,
        expected: usize,
        received: usize,
    },

    #[error("{0}")]
    Handler(HandlerError),

    #[error("Registration error in plugin '{plugin}': {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: Box<StratusError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<HandlerError> for StratusError {
    fn from(error: HandlerError) -> Self {
        StratusError::Handler(error)
    }
}

pub type Result<T> = std::result::Result<T, StratusError>;
