use anyhow::Result;
use kiln::application::command_table::INIT_ARTIFACT;
use kiln::application::DefaultDispatcher;
use serde_json::{Map, Value};

use crate::core::config::Config;
use crate::core::error::CliError;

/// Resolve and run `command`, returning the exit code kiln should exit with.
pub async fn execute(config: &Config, command: &str, argv: Vec<Value>) -> Result<i32> {
    let table = config
        .command_table()
        .map_err(|err| CliError::Config(err.to_string()))?;
    let mut dispatcher =
        DefaultDispatcher::from_settings(table, config.dispatch_settings()).map_err(CliError::from)?;
    dispatcher.link(INIT_ARTIFACT, kiln_plugin_init::entry);

    let code = dispatcher
        .dispatch(command, argv)
        .await
        .map_err(CliError::from)?;
    Ok(code)
}

/// Split raw external subcommand words into the command name and its
/// argument list. `--key=value` and `--flag` become options, everything else
/// stays positional.
pub fn external_argv(words: Vec<String>) -> (String, Vec<Value>) {
    let mut words = words.into_iter();
    let command = words.next().unwrap_or_default();

    let mut args = Vec::new();
    let mut options = Map::new();
    for word in words {
        match word.strip_prefix("--") {
            Some(flag) if !flag.is_empty() => match flag.split_once('=') {
                Some((key, value)) => {
                    options.insert(key.to_string(), Value::String(value.to_string()));
                }
                None => {
                    options.insert(flag.to_string(), Value::Bool(true));
                }
            },
            _ => args.push(Value::String(word)),
        }
    }

    args.push(Value::Object(options));
    (command, args)
}
