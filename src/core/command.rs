//! Text commands

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use crate::core::context::Context;
use crate::core::event::{Message, User};
use crate::core::module::Origin;
use crate::error::{AugurError, Result};

/// Async yes/no gate evaluated before a routine runs.
pub type Predicate<C> = Arc<dyn Fn(C) -> BoxFuture<'static, Result<bool>> + Send + Sync>;

pub type CommandProcess = Arc<dyn Fn(CommandContext, CommandInput) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub(crate) fn allow_all<C: Send + 'static>() -> Predicate<C> {
    predicate(|_: C| async { Ok(true) })
}

pub(crate) fn predicate<C, F, Fut>(f: F) -> Predicate<C>
where
    C: Send + 'static,
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool>> + Send + 'static,
{
    Arc::new(move |c| f(c).boxed())
}

/// Output of the parse routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: String,
    pub suffix: String,
    pub params: Vec<String>,
}

impl ParsedCommand {
    pub fn new(command: impl Into<String>, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        let params = suffix.split_whitespace().map(str::to_string).collect();
        Self {
            command: command.into().to_lowercase(),
            suffix,
            params,
        }
    }
}

/// How a command wants its trailing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamStyle {
    #[default]
    Suffix,
    Args,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandInput {
    Suffix(String),
    Args(Vec<String>),
}

impl CommandInput {
    pub fn from_parsed(parsed: &ParsedCommand, style: ParamStyle) -> Self {
        match style {
            ParamStyle::Suffix => CommandInput::Suffix(parsed.suffix.clone()),
            ParamStyle::Args => CommandInput::Args(parsed.params.clone()),
        }
    }

    pub fn text(&self) -> String {
        match self {
            CommandInput::Suffix(text) => text.clone(),
            CommandInput::Args(args) => args.join(" "),
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            CommandInput::Suffix(text) => text.split_whitespace().map(str::to_string).collect(),
            CommandInput::Args(args) => args.clone(),
        }
    }
}

/// Argument handed to command predicates and routines.
#[derive(Clone)]
pub struct CommandContext {
    pub ctx: Context,
    pub message: Arc<Message>,
    /// The token the command was invoked with (name or alias).
    pub invoked_as: String,
}

impl CommandContext {
    pub fn author(&self) -> &User {
        &self.message.author
    }

    pub async fn reply(&self, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        self.ctx.platform().reply(&self.message, &content).await
    }
}

pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub syntax: String,
    pub description: String,
    pub info: String,
    pub category: String,
    pub hidden: bool,
    pub enabled: bool,
    pub param_style: ParamStyle,
    permissions: Predicate<CommandContext>,
    process: CommandProcess,
    origin: Option<Origin>,
}

impl Command {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// Registry key: the lowercase name.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub(crate) fn set_origin(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }

    pub async fn permitted(&self, cx: CommandContext) -> Result<bool> {
        (self.permissions)(cx).await
    }

    /// Run the permission gate, then the routine. Disabled commands do nothing.
    pub async fn execute(&self, cx: CommandContext, input: CommandInput) -> Result<()> {
        if !self.enabled {
            tracing::debug!(command = %self.name, "skipping disabled command");
            return Ok(());
        }
        if self.permitted(cx.clone()).await? {
            (self.process)(cx, input).await
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("enabled", &self.enabled)
            .field("param_style", &self.param_style)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    syntax: String,
    description: Option<String>,
    info: Option<String>,
    category: Option<String>,
    hidden: bool,
    enabled: bool,
    param_style: ParamStyle,
    permissions: Option<Predicate<CommandContext>>,
    process: Option<CommandProcess>,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            syntax: String::new(),
            description: None,
            info: None,
            category: None,
            hidden: false,
            enabled: true,
            param_style: ParamStyle::Suffix,
            permissions: None,
            process: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = syntax.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn param_style(mut self, style: ParamStyle) -> Self {
        self.param_style = style;
        self
    }

    pub fn permissions<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.permissions = Some(predicate(f));
        self
    }

    pub fn process<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CommandContext, CommandInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.process = Some(Arc::new(move |cx, input| f(cx, input).boxed()));
        self
    }

    pub fn build(self) -> Result<Command> {
        let name = self.name.trim().to_string();
        let process = match self.process {
            Some(process) if !name.is_empty() => process,
            _ => {
                return Err(AugurError::ModuleLoad(
                    "Commands must have the name and process properties.".to_string(),
                ))
            }
        };
        let description = self
            .description
            .unwrap_or_else(|| format!("{} {}", name, self.syntax).trim().to_string());

        Ok(Command {
            info: self.info.unwrap_or_else(|| description.clone()),
            description,
            category: self.category.unwrap_or_else(|| "General".to_string()),
            name,
            aliases: self.aliases,
            syntax: self.syntax,
            hidden: self.hidden,
            enabled: self.enabled,
            param_style: self.param_style,
            permissions: self.permissions.unwrap_or_else(allow_all),
            process,
            origin: None,
        })
    }
}
