use serde_json::{json, Value};

/// Argument list for `kiln init`: the project name (when given) followed by
/// the options object.
pub fn argv(project_name: Option<String>, force: bool) -> Vec<Value> {
    let mut argv: Vec<Value> = project_name.into_iter().map(Value::String).collect();
    argv.push(json!({ "force": force }));
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_argv() {
        assert_eq!(
            argv(Some("my-project".to_string()), true),
            vec![json!("my-project"), json!({ "force": true })]
        );
        assert_eq!(argv(None, false), vec![json!({ "force": false })]);
    }
}
