//! @acp:module "Parameters"
//! @acp:summary "Positional arguments and flagged options of a command"
//! @acp:domain cli
//! @acp:layer model

use super::choice::{ChoiceEntry, ChoiceSource};

/// Positional argument or flagged option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Argument,
    Option,
}

/// @acp:summary "Declaration of one argument or option"
///
/// Built with chained setters and validated when the owning command is built.
#[derive(Debug, Clone)]
pub struct Param {
    kind: ParamKind,
    name: String,
    description: Option<String>,
    default: Vec<String>,
    choices: Option<ChoiceSource>,
    optional: bool,
    multiple: bool,
    alias: Option<char>,
}

impl Param {
    /// Declare a positional argument
    pub fn argument(name: impl Into<String>) -> Self {
        Self::new(ParamKind::Argument, name.into())
    }

    /// Declare a `--name` option
    pub fn option(name: impl Into<String>) -> Self {
        Self::new(ParamKind::Option, name.into())
    }

    fn new(kind: ParamKind, name: String) -> Self {
        Self {
            kind,
            name,
            description: None,
            default: Vec::new(),
            choices: None,
            optional: false,
            multiple: false,
            alias: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Single default key
    pub fn default(mut self, key: impl Into<String>) -> Self {
        self.default = vec![key.into()];
        self
    }

    /// Several default keys, for `multiple` parameters
    pub fn defaults<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Static choice set, normalized immediately
    pub fn choices<I, E>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ChoiceEntry>,
    {
        self.choices = Some(ChoiceSource::fixed(entries));
        self
    }

    /// Choice set computed on first use within an invocation
    pub fn computed_choices<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Vec<ChoiceEntry> + Send + Sync + 'static,
    {
        self.choices = Some(ChoiceSource::computed(f));
        self
    }

    pub fn choice_source(mut self, source: ChoiceSource) -> Self {
        self.choices = Some(source);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Short flag, options only
    pub fn alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description, falling back to the name
    pub fn help(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    pub fn default_keys(&self) -> &[String] {
        &self.default
    }

    pub fn choices_source(&self) -> Option<&ChoiceSource> {
        self.choices.as_ref()
    }

    pub fn has_choices(&self) -> bool {
        self.choices.is_some()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn short(&self) -> Option<char> {
        self.alias
    }

    /// Whether argv must carry a token: non-optional and no default to fall back on
    pub fn requires_token(&self) -> bool {
        !self.optional && self.default.is_empty()
    }

    /// @acp:summary "Usage grammar, e.g. `<branch>`, `[files...]`, `-t, --tags <tags...>`"
    pub fn grammar(&self) -> String {
        let mut name = self.name.clone();
        if self.multiple {
            name.push_str("...");
        }
        let token = if self.optional {
            format!("[{name}]")
        } else {
            format!("<{name}>")
        };

        match (self.kind, self.alias) {
            (ParamKind::Argument, _) => token,
            (ParamKind::Option, Some(alias)) => format!("-{alias}, --{} {token}", self.name),
            (ParamKind::Option, None) => format!("--{} {token}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_grammar() {
        assert_eq!(Param::argument("branch").grammar(), "<branch>");
        assert_eq!(Param::argument("files").optional().multiple().grammar(), "[files...]");
        assert_eq!(Param::argument("names").multiple().grammar(), "<names...>");
    }

    #[test]
    fn test_option_grammar() {
        assert_eq!(Param::option("base").grammar(), "--base <base>");
        assert_eq!(
            Param::option("tags").alias('t').multiple().grammar(),
            "-t, --tags <tags...>"
        );
        assert_eq!(Param::option("dev").optional().grammar(), "--dev [dev]");
    }

    #[test]
    fn test_scalar_default_is_a_list() {
        let param = Param::argument("branch").default("master");
        assert_eq!(param.default_keys(), ["master".to_string()]);
        assert!(!param.requires_token());
    }

    #[test]
    fn test_help_falls_back_to_name() {
        assert_eq!(Param::option("dev").help(), "dev");
        assert_eq!(Param::option("dev").description("push target").help(), "push target");
    }
}
