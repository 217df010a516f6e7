use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Exported function of a command artifact: receives the argument list
/// (positional arguments, then the options object) and returns an exit code.
pub type Entrypoint = fn(Vec<Value>) -> i32;

/// Serializable form of one command invocation.
///
/// Built from the argument list a command handler receives: positional
/// arguments followed by a trailing options object. Bookkeeping keys of the
/// options object are dropped so only data a command reads crosses a process
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationEnvelope {
    pub command: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl InvocationEnvelope {
    pub fn new(command: impl Into<String>, args: Vec<Value>, options: Map<String, Value>) -> Self {
        Self {
            command: command.into(),
            args,
            options: strip_internal(options),
        }
    }

    /// Split `argv` into positional arguments and the trailing options object.
    ///
    /// When the last element is not an object every element is positional and
    /// the options map stays empty.
    pub fn from_argv(command: impl Into<String>, mut argv: Vec<Value>) -> Self {
        let options = match argv.last() {
            Some(Value::Object(_)) => match argv.pop() {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            },
            _ => Map::new(),
        };

        Self::new(command, argv, options)
    }

    /// Rebuild the `positional.., options` shape handlers are called with.
    pub fn into_argv(self) -> Vec<Value> {
        let mut argv = self.args;
        argv.push(Value::Object(self.options));
        argv
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.options
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Keys that never cross a process boundary: `_`-prefixed bookkeeping and the
/// back-reference to the parent command.
pub fn is_internal_key(key: &str) -> bool {
    key.starts_with('_') || key == "parent"
}

fn strip_internal(options: Map<String, Value>) -> Map<String, Value> {
    options
        .into_iter()
        .filter(|(key, _)| !is_internal_key(key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_argv_strips_bookkeeping() {
        let argv = vec![
            json!("my-project"),
            json!({ "force": true, "_internal": "x", "parent": {} }),
        ];

        let envelope = InvocationEnvelope::from_argv("init", argv);

        assert_eq!(envelope.args, vec![json!("my-project")]);
        assert_eq!(envelope.options.len(), 1);
        assert!(envelope.flag("force"));
        assert!(envelope.option("_internal").is_none());
        assert!(envelope.option("parent").is_none());
    }

    #[test]
    fn test_from_argv_without_options_object() {
        let envelope = InvocationEnvelope::from_argv("init", vec![json!("a"), json!("b")]);

        assert_eq!(envelope.args, vec![json!("a"), json!("b")]);
        assert!(envelope.options.is_empty());
    }

    #[test]
    fn test_into_argv_appends_options() {
        let envelope = InvocationEnvelope::from_argv(
            "init",
            vec![json!("demo"), json!({ "force": false })],
        );

        assert_eq!(
            envelope.into_argv(),
            vec![json!("demo"), json!({ "force": false })]
        );
    }

    #[test]
    fn test_nested_values_are_kept() {
        let envelope = InvocationEnvelope::from_argv(
            "init",
            vec![json!({ "template": { "name": "vue", "_keep": 1 } })],
        );

        // only top level keys are bookkeeping
        assert_eq!(
            envelope.option("template"),
            Some(&json!({ "name": "vue", "_keep": 1 }))
        );
    }
}
