use serde_json::{Map, Value};

/// Arguments of one invocation, split into positionals and options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandContext {
    pub args: Vec<Value>,
    pub options: Map<String, Value>,
}

impl CommandContext {
    /// Split the trailing options object off `argv`.
    pub fn from_argv(mut argv: Vec<Value>) -> Self {
        let options = match argv.last() {
            Some(Value::Object(_)) => match argv.pop() {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            },
            _ => Map::new(),
        };

        Self {
            args: argv,
            options,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(Value::as_str)
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_options() {
        let ctx = CommandContext::from_argv(vec![json!("demo"), json!({ "force": true })]);

        assert_eq!(ctx.arg_str(0), Some("demo"));
        assert!(ctx.flag("force"));
        assert!(!ctx.flag("verbose"));
    }

    #[test]
    fn test_no_options_object() {
        let ctx = CommandContext::from_argv(vec![json!("a"), json!(2)]);

        assert_eq!(ctx.args.len(), 2);
        assert!(ctx.options.is_empty());
    }
}
