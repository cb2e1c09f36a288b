//! Name and alias tables for text commands

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use crate::core::command::{Command, CommandContext, CommandInput, ParsedCommand};
use crate::core::context::Context;
use crate::core::event::Message;
use crate::core::module::Origin;
use crate::core::report::ErrorContext;
use crate::error::ResultExt;

#[derive(Default)]
struct CommandTables {
    names: HashMap<String, Arc<Command>>,
    aliases: HashMap<String, Arc<Command>>,
}

/// First write wins for both names and aliases.
#[derive(Default)]
pub struct CommandRegistry {
    tables: RwLock<CommandTables>,
    invocations: AtomicU64,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `commands` under `origin`, returning how many claimed a name slot.
    ///
    /// A command whose name is taken is still reachable through any of its
    /// aliases that are free.
    pub fn register(&self, origin: &Origin, commands: Vec<Command>) -> usize {
        let mut tables = self.tables.write();
        let mut installed = 0;

        for mut command in commands {
            command.set_origin(origin.clone());
            let command = Arc::new(command);
            let key = command.key();

            if tables.names.contains_key(&key) {
                tracing::debug!(origin = %origin, command = %key, "command name already claimed");
            } else {
                tables.names.insert(key, Arc::clone(&command));
                installed += 1;
            }

            for alias in &command.aliases {
                let alias = alias.to_lowercase();
                if tables.aliases.contains_key(&alias) {
                    tracing::debug!(origin = %origin, alias = %alias, "alias already claimed");
                    continue;
                }
                tables.aliases.insert(alias, Arc::clone(&command));
            }
        }

        installed
    }

    /// Case-insensitive lookup: canonical names first, then aliases.
    pub fn resolve(&self, token: &str) -> Option<Arc<Command>> {
        let token = token.to_lowercase();
        let tables = self.tables.read();
        tables
            .names
            .get(&token)
            .or_else(|| tables.aliases.get(&token))
            .cloned()
    }

    /// Run the command named by `parsed`. Returns whether a command was found.
    ///
    /// Failures are reported through the context and never returned.
    pub async fn execute(&self, ctx: &Context, message: Arc<Message>, parsed: &ParsedCommand) -> bool {
        let Some(command) = self.resolve(&parsed.command) else {
            return false;
        };
        self.invocations.fetch_add(1, Ordering::Relaxed);

        let scoped = match command.origin() {
            Some(origin) => ctx.with_module(origin.clone()),
            None => ctx.clone(),
        };
        let cx = CommandContext {
            ctx: scoped,
            message: Arc::clone(&message),
            invoked_as: parsed.command.clone(),
        };
        let input = CommandInput::from_parsed(parsed, command.param_style);

        tracing::debug!(command = %command.name, invoked_as = %parsed.command, "executing command");
        if let Err(e) = command.execute(cx, input).await.with_command(&command.name) {
            ctx.report(
                &e,
                &ErrorContext::Command {
                    name: command.name.clone(),
                    message,
                },
            );
        }
        true
    }

    /// Drop every name and alias slot occupied by `origin`.
    pub fn unload_origin(&self, origin: &Origin) -> usize {
        let mut tables = self.tables.write();
        let owned = |command: &Arc<Command>| command.origin() == Some(origin);
        let before = tables.names.len();
        tables.names.retain(|_, command| !owned(&*command));
        tables.aliases.retain(|_, command| !owned(&*command));
        before - tables.names.len()
    }

    /// Canonical commands sorted by category, then name.
    pub fn list(&self) -> Vec<Arc<Command>> {
        let mut commands: Vec<_> = self.tables.read().names.values().cloned().collect();
        commands.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.key().cmp(&b.key())));
        commands
    }

    pub fn names_for(&self, origin: &Origin) -> Vec<String> {
        let mut names: Vec<_> = self
            .tables
            .read()
            .names
            .iter()
            .filter(|(_, command)| command.origin() == Some(origin))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn command_count(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.tables.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut tables = self.tables.write();
        tables.names.clear();
        tables.aliases.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::CommandContext;
    use crate::testing::{message, test_context};

    fn command(name: &str, aliases: &[&str]) -> Command {
        Command::builder(name)
            .aliases(aliases.iter().copied())
            .process(|_, _| async { Ok(()) })
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolution_is_case_insensitive() {
        let registry = CommandRegistry::new();
        registry.register(&Origin::new("a"), vec![command("Ping", &["P"])]);

        for token in ["ping", "PING", "PiNg", "p"] {
            let found = registry.resolve(token).expect("resolves");
            assert_eq!(found.name, "Ping");
        }
        assert!(registry.resolve("pong").is_none());
    }

    #[test]
    fn test_first_write_wins_but_free_aliases_install() {
        let registry = CommandRegistry::new();
        let first = Origin::new("first");
        let second = Origin::new("second");

        assert_eq!(registry.register(&first, vec![command("roll", &["r"])]), 1);
        assert_eq!(registry.register(&second, vec![command("roll", &["r", "dice"])]), 0);

        assert_eq!(registry.resolve("roll").unwrap().origin(), Some(&first));
        assert_eq!(registry.resolve("r").unwrap().origin(), Some(&first));
        assert_eq!(registry.resolve("dice").unwrap().origin(), Some(&second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unload_origin_clears_names_and_aliases() {
        let registry = CommandRegistry::new();
        let fun = Origin::new("fun");
        let admin = Origin::new("admin");
        registry.register(&fun, vec![command("joke", &["j"]), command("roll", &[])]);
        registry.register(&admin, vec![command("ban", &["b"])]);

        assert_eq!(registry.unload_origin(&fun), 2);
        assert!(registry.resolve("joke").is_none());
        assert!(registry.resolve("j").is_none());
        assert!(registry.resolve("b").is_some());
        assert_eq!(registry.names_for(&admin), vec!["ban"]);
        assert_eq!(registry.unload_origin(&fun), 0);
    }

    #[test]
    fn test_list_sorted_by_category_then_name() {
        let registry = CommandRegistry::new();
        let mods = Command::builder("kick")
            .category("Mod")
            .process(|_, _| async { Ok(()) })
            .build()
            .unwrap();
        registry.register(&Origin::new("a"), vec![command("zap", &[]), mods, command("echo", &[])]);

        let names: Vec<_> = registry.list().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["echo", "zap", "kick"]);
    }

    #[tokio::test]
    async fn test_execute_counts_and_reports_failures() {
        let (ctx, _, reporter) = test_context();
        let registry = CommandRegistry::new();
        let broken = Command::builder("broken")
            .process(|_, _| async { Err(crate::error::AugurError::Handler("boom".into())) })
            .build()
            .unwrap();
        registry.register(&Origin::new("a"), vec![broken]);

        let msg = Arc::new(message("u1", "!broken"));
        assert!(!registry.execute(&ctx, Arc::clone(&msg), &ParsedCommand::new("missing", "")).await);
        assert_eq!(registry.command_count(), 0);

        assert!(registry.execute(&ctx, msg, &ParsedCommand::new("BROKEN", "")).await);
        assert_eq!(registry.command_count(), 1);

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].0.contains("boom"));
        assert!(reports[0].0.contains("[command: broken]"));
    }

    #[tokio::test]
    async fn test_execute_scopes_context_to_origin() {
        let (ctx, platform, _) = test_context();
        let registry = CommandRegistry::new();
        let whoami = Command::builder("whoami")
            .process(|cx: CommandContext, _| async move {
                let origin = cx.ctx.origin().map(|o| o.to_string()).unwrap_or_default();
                cx.reply(origin).await
            })
            .build()
            .unwrap();
        registry.register(&Origin::new("modules/info"), vec![whoami]);

        registry
            .execute(&ctx, Arc::new(message("u1", "!whoami")), &ParsedCommand::new("whoami", ""))
            .await;
        assert_eq!(platform.sent_contents(), vec!["modules/info"]);
    }
}
