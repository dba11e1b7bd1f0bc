//! @acp:module "Direct Binder"
//! @acp:summary "Maps the command tree onto clap and resolves parsed tokens"
//! @acp:domain cli
//! @acp:layer service
//!
//! The clap tree is rebuilt from the command forest for every invocation, so
//! registration is a pure function of the declaration and cannot accumulate
//! duplicate subcommands.

use std::ffi::{OsStr, OsString};
use std::sync::Arc;

use clap::builder::{PossibleValue, PossibleValuesParser, TypedValueParser};
use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::Map;

use super::cache::ChoiceCache;
use super::resolve::{resolve_param, ResolvedData};
use crate::config::AppConfig;
use crate::error::Result;
use crate::model::{Choice, CommandNode, Param, ParamKind};

/// Id of the reserved root-level flag
pub const INTERACTIVE_FLAG: &str = "interactive";

/// @acp:summary "What argv selected"
#[derive(Debug)]
pub enum DirectParse<'a> {
    /// No subcommand was given
    Root { interactive: bool },
    /// A command path was matched
    Command {
        node: &'a CommandNode,
        path: Vec<String>,
        matches: ArgMatches,
    },
}

/// @acp:summary "argv binding for one invocation"
pub struct DirectBinder<'a> {
    config: &'a AppConfig,
    commands: &'a [CommandNode],
    cache: ChoiceCache,
}

impl<'a> DirectBinder<'a> {
    pub fn new(config: &'a AppConfig, commands: &'a [CommandNode], cache: ChoiceCache) -> Self {
        Self {
            config,
            commands,
            cache,
        }
    }

    /// @acp:summary "Build the complete clap tree"
    pub fn command(&self) -> Command {
        let root = Command::new(self.config.name.clone())
            .version(self.config.version.clone())
            .about(self.config.description().to_string())
            .subcommand_required(false)
            .arg(
                Arg::new(INTERACTIVE_FLAG)
                    .short('i')
                    .long(INTERACTIVE_FLAG)
                    .help("Run as an interactive wizard")
                    .action(ArgAction::SetTrue),
            );

        self.commands.iter().fold(root, |root, node| {
            root.subcommand(self.node_command(node, &mut Vec::new()))
        })
    }

    fn node_command(&self, node: &CommandNode, path: &mut Vec<String>) -> Command {
        path.push(node.name().to_string());

        let mut command = Command::new(node.name().to_string())
            .about(node.description().to_string())
            .subcommand_required(false);

        for param in node.params() {
            command = command.arg(self.param_arg(param, path));
        }
        for child in node.children() {
            command = command.subcommand(self.node_command(child, path));
        }
        command = command.override_usage(self.usage(node, path));

        path.pop();
        command
    }

    /// Usage line built from each parameter's grammar
    fn usage(&self, node: &CommandNode, path: &[String]) -> String {
        let mut usage = std::iter::once(self.config.name.as_str())
            .chain(path.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        for param in node.params() {
            usage.push(' ');
            usage.push_str(&param.grammar());
        }
        if !node.is_leaf() {
            usage.push_str(" [command]");
        }
        usage
    }

    fn param_arg(&self, param: &Param, path: &[String]) -> Arg {
        let mut help = param.help().to_string();
        if !param.default_keys().is_empty() {
            help = format!("{help} [default: {}]", param.default_keys().join(", "));
        }

        // Defaults are substituted during resolution, never by clap
        let mut arg = Arg::new(param.name().to_string())
            .value_name(param.name().to_string())
            .help(help)
            .required(param.requires_token());

        arg = if param.is_multiple() {
            arg.num_args(1..).action(ArgAction::Append)
        } else {
            arg.num_args(1).action(ArgAction::Set)
        };

        if param.kind() == ParamKind::Option {
            arg = arg.long(param.name().to_string());
            if let Some(short) = param.short() {
                arg = arg.short(short);
            }
        }

        if param.has_choices() {
            arg.value_parser(ChoiceParser {
                path: path.to_vec(),
                param: param.clone(),
                cache: self.cache.clone(),
            })
        } else {
            arg.value_parser(clap::value_parser!(String))
        }
    }

    /// @acp:summary "Parse argv and locate the selected command"
    pub fn parse<I, T>(&self, argv: I) -> std::result::Result<DirectParse<'a>, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut command = self.command();
        let matches = command.try_get_matches_from_mut(argv)?;
        let interactive = matches.get_flag(INTERACTIVE_FLAG);

        let Some((name, mut current)) = matches.subcommand() else {
            return Ok(DirectParse::Root { interactive });
        };

        let mut node = self
            .commands
            .iter()
            .find(|node| node.name() == name)
            .ok_or_else(|| unknown_subcommand(&mut command, name))?;
        let mut path = vec![name.to_string()];

        while let Some((name, sub)) = current.subcommand() {
            node = node
                .child(name)
                .ok_or_else(|| unknown_subcommand(&mut command, name))?;
            path.push(name.to_string());
            current = sub;
        }

        Ok(DirectParse::Command {
            node,
            path,
            matches: current.clone(),
        })
    }

    /// @acp:summary "Resolve a matched leaf into action data"
    pub fn resolve(
        &self,
        node: &CommandNode,
        path: &[String],
        matches: &ArgMatches,
    ) -> Result<ResolvedData> {
        let mut arguments = Map::new();
        for param in node.arguments() {
            if let Some(value) = self.resolve_matched(param, path, matches)? {
                arguments.insert(param.name().to_string(), value);
            }
        }

        let mut options = Map::new();
        for param in node.options() {
            if let Some(value) = self.resolve_matched(param, path, matches)? {
                options.insert(param.name().to_string(), value);
            }
        }

        Ok(ResolvedData::merge(arguments, options))
    }

    fn resolve_matched(
        &self,
        param: &Param,
        path: &[String],
        matches: &ArgMatches,
    ) -> Result<Option<serde_json::Value>> {
        let supplied = supplied_tokens(matches, param);
        let choices = self.cache.choices(path, param)?;
        resolve_param(param, supplied, choices.as_deref())
    }

    /// Help text for the command at `path`, rendered with its full usage line
    pub fn render_help(&self, path: &[String]) -> String {
        let argv = std::iter::once(self.config.name.clone())
            .chain(path.iter().cloned())
            .chain(std::iter::once("--help".to_string()));

        match self.command().try_get_matches_from(argv) {
            Err(err) => err.render().to_string(),
            Ok(_) => self.command().render_help().to_string(),
        }
    }
}

fn supplied_tokens(matches: &ArgMatches, param: &Param) -> Option<Vec<String>> {
    let id = param.name();
    if matches.value_source(id) != Some(ValueSource::CommandLine) {
        return None;
    }

    if param.is_multiple() {
        matches
            .get_many::<String>(id)
            .map(|values| values.cloned().collect())
    } else {
        matches.get_one::<String>(id).map(|value| vec![value.clone()])
    }
}

fn unknown_subcommand(command: &mut Command, name: &str) -> clap::Error {
    command.error(
        ErrorKind::InvalidSubcommand,
        format!("unrecognized subcommand '{name}'"),
    )
}

/// @acp:summary "Validates tokens against a lazily-evaluated choice set"
///
/// Goes through the invocation's [`ChoiceCache`], so parsing, help output and
/// resolution all see one evaluation of a computed set. A set that fails its
/// checks rejects the token here and stays recorded in the cache, where the
/// caller picks it up as a configuration error.
#[derive(Clone)]
struct ChoiceParser {
    path: Vec<String>,
    param: Param,
    cache: ChoiceCache,
}

impl ChoiceParser {
    fn choices(&self) -> Result<Arc<[Choice]>> {
        Ok(self
            .cache
            .choices(&self.path, &self.param)?
            .unwrap_or_else(|| Arc::from(Vec::new())))
    }
}

impl TypedValueParser for ChoiceParser {
    type Value = String;

    fn parse_ref(
        &self,
        cmd: &Command,
        arg: Option<&Arg>,
        value: &OsStr,
    ) -> std::result::Result<Self::Value, clap::Error> {
        let choices = self
            .choices()
            .map_err(|err| clap::Error::raw(ErrorKind::ValueValidation, format!("{err}\n")))?;
        let keys: Vec<String> = choices.iter().map(|choice| choice.key.clone()).collect();
        PossibleValuesParser::new(keys).parse_ref(cmd, arg, value)
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        let choices = self.choices().ok()?;
        let values: Vec<PossibleValue> = choices
            .iter()
            .map(|choice| {
                let value = PossibleValue::new(choice.key.clone());
                if choice.label != choice.key {
                    value.help(choice.label.clone())
                } else {
                    value
                }
            })
            .collect();
        Some(Box::new(values.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChoiceEntry;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> AppConfig {
        AppConfig::new("cli", "0.0.1")
    }

    fn tree() -> Vec<CommandNode> {
        let checkout = CommandNode::builder("checkout")
            .param(
                Param::argument("branch")
                    .choices([ChoiceEntry::from("master"), ChoiceEntry::item("develop", "dev-branch")])
                    .default("master"),
            )
            .build()
            .unwrap();
        let git = CommandNode::builder("git").child(checkout).build().unwrap();
        let tag = CommandNode::builder("tag")
            .param(Param::argument("message"))
            .param(
                Param::option("tags")
                    .alias('t')
                    .multiple()
                    .choices(["a", "b", "c"])
                    .defaults(["a"]),
            )
            .build()
            .unwrap();
        vec![git, tag]
    }

    fn parse_and_resolve(commands: &[CommandNode], argv: &[&str]) -> ResolvedData {
        let config = config();
        let binder = DirectBinder::new(&config, commands, ChoiceCache::new());
        match binder.parse(argv.iter().copied()).unwrap() {
            DirectParse::Command { node, path, matches } => {
                binder.resolve(node, &path, &matches).unwrap()
            }
            other => panic!("expected a command, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_path_is_resolved() {
        let commands = tree();
        let config = config();
        let binder = DirectBinder::new(&config, &commands, ChoiceCache::new());
        match binder.parse(["cli", "git", "checkout", "develop"]).unwrap() {
            DirectParse::Command { node, path, .. } => {
                assert_eq!(node.name(), "checkout");
                assert_eq!(path, vec!["git", "checkout"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_default_and_payload_substitution() {
        let commands = tree();
        let data = parse_and_resolve(&commands, &["cli", "git", "checkout"]);
        assert_eq!(data.value("branch"), Some(&json!("master")));

        let data = parse_and_resolve(&commands, &["cli", "git", "checkout", "develop"]);
        assert_eq!(data.value("branch"), Some(&json!("dev-branch")));
    }

    #[test]
    fn test_multiple_option_collects_repeated_flags() {
        let commands = tree();
        let data = parse_and_resolve(&commands, &["cli", "tag", "hi", "--tags", "b", "-t", "c"]);
        assert_eq!(data.value("tags"), Some(&json!(["b", "c"])));
        assert_eq!(data.value("message"), Some(&json!("hi")));

        let data = parse_and_resolve(&commands, &["cli", "tag", "hi"]);
        assert_eq!(data.value("tags"), Some(&json!(["a"])));
    }

    #[test]
    fn test_out_of_vocabulary_token_is_rejected() {
        let commands = tree();
        let config = config();
        let binder = DirectBinder::new(&config, &commands, ChoiceCache::new());
        let err = binder.parse(["cli", "git", "checkout", "main"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_missing_required_argument_is_rejected() {
        let commands = tree();
        let config = config();
        let binder = DirectBinder::new(&config, &commands, ChoiceCache::new());
        let err = binder.parse(["cli", "tag"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_interactive_flag_at_root() {
        let commands = tree();
        let config = config();
        let binder = DirectBinder::new(&config, &commands, ChoiceCache::new());
        assert!(matches!(
            binder.parse(["cli", "-i"]).unwrap(),
            DirectParse::Root { interactive: true }
        ));
        assert!(matches!(
            binder.parse(["cli"]).unwrap(),
            DirectParse::Root { interactive: false }
        ));
    }

    #[test]
    fn test_building_twice_does_not_duplicate_children() {
        let commands = tree();
        let config = config();
        let binder = DirectBinder::new(&config, &commands, ChoiceCache::new());
        let first = binder.command();
        let second = binder.command();
        assert_eq!(first.get_subcommands().count(), 2);
        assert_eq!(second.get_subcommands().count(), 2);
        let git = second.find_subcommand("git").unwrap();
        assert_eq!(git.get_subcommands().count(), 1);
    }

    #[test]
    fn test_help_shows_defaults_and_choices() {
        let commands = tree();
        let config = config();
        let binder = DirectBinder::new(&config, &commands, ChoiceCache::new());
        let help = binder.render_help(&["tag".to_string()]);
        assert!(help.contains("[default: a]"));
        assert!(help.contains("possible values"));
        assert!(help.contains("cli tag"));
    }

    #[test]
    fn test_usage_line_follows_parameter_grammar() {
        let commands = tree();
        let config = config();
        let binder = DirectBinder::new(&config, &commands, ChoiceCache::new());

        let help = binder.render_help(&["tag".to_string()]);
        assert!(help.contains("Usage: cli tag <message> -t, --tags <tags...>"), "{help}");

        let help = binder.render_help(&["git".to_string()]);
        assert!(help.contains("Usage: cli git [command]"), "{help}");
    }
}
