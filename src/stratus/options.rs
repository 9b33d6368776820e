//! Option declarations and parsed option values.
//!
//! An [`OptionSpec`] is declared per tree node at registration time; flag
//! identity is the long form. Every command additionally carries the
//! universal options (`--verbose`/`-v`, `--json`, `--help`/`-h`), attached
//! automatically when the command is registered.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;

/// Whether a flag consumes a following token as its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgMode {
    /// Boolean flag, no value.
    None,
    /// The following token is the value; its absence is an error.
    Required,
    /// The following token is the value only if present and not flag-like.
    Optional,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    pub long: String,
    #[serde(skip)]
    pub arg: ArgMode,
    pub description: String,
}

impl OptionSpec {
    pub fn new(
        short: Option<char>,
        long: impl Into<String>,
        arg: ArgMode,
        description: impl Into<String>,
    ) -> Self {
        Self {
            short,
            long: long.into(),
            arg,
            description: description.into(),
        }
    }

    /// Whether `token` invokes this option (`--long` or `-s`).
    pub fn matches(&self, token: &str) -> bool {
        if let Some(rest) = token.strip_prefix("--") {
            return rest == self.long;
        }
        match (token.strip_prefix('-'), self.short) {
            (Some(rest), Some(short)) => {
                let mut chars = rest.chars();
                chars.next() == Some(short) && chars.next().is_none()
            }
            _ => false,
        }
    }

    /// Rendered flag column for help output, e.g. `-v, --verbose <value>`.
    pub fn usage(&self) -> String {
        let mut s = match self.short {
            Some(short) => format!("-{}, --{}", short, self.long),
            None => format!("    --{}", self.long),
        };
        match self.arg {
            ArgMode::None => {}
            ArgMode::Required => s.push_str(&format!(" <{}>", self.long)),
            ArgMode::Optional => s.push_str(&format!(" [{}]", self.long)),
        }
        s
    }
}

/// Options attached to every registered command.
pub static UNIVERSAL_OPTIONS: Lazy<Vec<OptionSpec>> = Lazy::new(|| {
    vec![
        OptionSpec::new(
            Some('v'),
            "verbose",
            ArgMode::None,
            "increase log verbosity (repeat for trace output)",
        ),
        OptionSpec::new(None, "json", ArgMode::None, "use machine-readable json output"),
        OptionSpec::new(Some('h'), "help", ArgMode::None, "display help for the command"),
    ]
});

/// Look up a universal option by token. These resolve at any tree level,
/// mirroring their registration-time attachment to every command.
pub fn universal_for(token: &str) -> Option<&'static OptionSpec> {
    UNIVERSAL_OPTIONS.iter().find(|spec| spec.matches(token))
}

/// Value captured for one long flag during a parse.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Boolean flag; the count tracks repeated occurrences (`-v -v`).
    Switch(u32),
    /// Captured argument string.
    Value(String),
    /// Optional-argument flag invoked with no value supplied.
    Empty,
}

/// Parsed option values, keyed by long flag name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionValues {
    values: BTreeMap<String, OptionValue>,
}

impl OptionValues {
    pub fn record_switch(&mut self, long: &str) {
        match self.values.get_mut(long) {
            Some(OptionValue::Switch(count)) => *count += 1,
            _ => {
                self.values
                    .insert(long.to_string(), OptionValue::Switch(1));
            }
        }
    }

    pub fn record_value(&mut self, long: &str, value: impl Into<String>) {
        self.values
            .insert(long.to_string(), OptionValue::Value(value.into()));
    }

    pub fn record_empty(&mut self, long: &str) {
        self.values.insert(long.to_string(), OptionValue::Empty);
    }

    /// Whether the flag was present at all.
    pub fn is_set(&self, long: &str) -> bool {
        self.values.contains_key(long)
    }

    /// Captured string value, if one was supplied.
    pub fn get(&self, long: &str) -> Option<&str> {
        match self.values.get(long) {
            Some(OptionValue::Value(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Occurrence count for a boolean flag (0 when absent).
    pub fn count(&self, long: &str) -> u32 {
        match self.values.get(long) {
            Some(OptionValue::Switch(count)) => *count,
            Some(_) => 1,
            None => 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
