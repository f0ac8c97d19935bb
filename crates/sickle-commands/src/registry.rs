//! Command registry: the built-in command table plus per-guild custom commands.

use crate::framework::{CommandContext, CommandResult};
use crate::permissions::Permission;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use poise::serenity_prelude as serenity;
use rand::seq::IteratorRandom;
use sickle_common::GuildId;
use sickle_store::{DocumentStore, StoreError};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Type-erased command handler.
pub type Handler = Arc<dyn Fn(CommandContext) -> BoxFuture<'static, CommandResult> + Send + Sync>;

/// A built-in command and its metadata.
#[derive(Clone)]
pub struct Command {
    /// Invocation name, e.g. `bot.set.ch`.
    pub name: String,
    /// Module the command is listed under.
    pub module: String,
    /// Who may run it.
    pub permission: Permission,
    /// Guild permissions that make a member a moderator for this command.
    pub requires: serenity::Permissions,
    /// Runs even in channels where the bot is disabled.
    pub anywhere: bool,
    /// Usage example without the prefix.
    pub example: String,
    /// Help text.
    pub help: String,
    /// The handler.
    pub handler: Handler,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("permission", &self.permission)
            .field("anywhere", &self.anywhere)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Creates a command with default metadata: anyone may run it, and the
    /// channel enable flag applies.
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            module: String::new(),
            permission: Permission::Anyone,
            requires: serenity::Permissions::MANAGE_CHANNELS,
            anywhere: false,
            example: String::new(),
            help: String::new(),
            handler: Arc::new(move |ctx| handler(ctx).boxed()),
        }
    }

    /// Sets the module.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Sets the permission level.
    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    /// Sets the guild permissions checked for moderators.
    pub fn requires(mut self, requires: serenity::Permissions) -> Self {
        self.requires = requires;
        self
    }

    /// Lets the command run in disabled channels.
    pub fn anywhere(mut self) -> Self {
        self.anywhere = true;
        self
    }

    /// Sets the usage example (without prefix).
    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    /// Sets the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Runs the handler.
    pub fn invoke(&self, ctx: CommandContext) -> BoxFuture<'static, CommandResult> {
        (self.handler)(ctx)
    }
}

/// Registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A built-in command with this name already exists
    #[error("Command \"{0}\" is already registered")]
    Duplicate(String),
    /// Custom commands cannot shadow built-ins
    #[error("\"{0}\" is a built-in command")]
    Builtin(String),
}

/// What a command name resolved to.
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    /// A built-in command.
    Builtin(&'a Command),
    /// A guild's custom command and its reply text.
    Custom(String),
}

impl Resolved<'_> {
    /// Whether the command answers in channels where the bot is disabled.
    /// Custom commands always do.
    pub fn anywhere(&self) -> bool {
        match self {
            Resolved::Builtin(command) => command.anywhere,
            Resolved::Custom(_) => true,
        }
    }
}

/// Registry for managing bot commands
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
    modules: BTreeMap<String, Vec<String>>,
    custom: DashMap<(GuildId, String), String>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one built-in command.
    pub fn register(&mut self, command: Command) -> Result<(), RegistryError> {
        if self.commands.contains_key(&command.name) {
            return Err(RegistryError::Duplicate(command.name));
        }
        debug!(module = %command.module, "Registered command {}", command.name);
        self.modules
            .entry(command.module.clone())
            .or_default()
            .push(command.name.clone());
        self.commands.insert(command.name.clone(), command);
        Ok(())
    }

    /// Register a batch of built-in commands.
    pub fn register_all(
        &mut self,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<(), RegistryError> {
        commands.into_iter().try_for_each(|c| self.register(c))
    }

    /// Built-in command by name.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Whether `name` is a built-in command.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// All built-in commands in name order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Looks up `name`, built-ins first, then the guild's custom commands.
    pub fn resolve(&self, guild: Option<GuildId>, name: &str) -> Option<Resolved<'_>> {
        if let Some(command) = self.commands.get(name) {
            return Some(Resolved::Builtin(command));
        }
        let guild = guild?;
        self.custom
            .get(&(guild, name.to_string()))
            .map(|text| Resolved::Custom(text.value().clone()))
    }

    /// Module names in order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Command names of a module in registration order.
    pub fn module_commands(&self, module: &str) -> Option<&[String]> {
        self.modules.get(module).map(Vec::as_slice)
    }

    /// Adds or replaces a guild custom command.
    pub fn set_custom(&self, guild: GuildId, name: &str, text: &str) -> Result<(), RegistryError> {
        if self.is_builtin(name) {
            return Err(RegistryError::Builtin(name.to_string()));
        }
        self.custom.insert((guild, name.to_string()), text.to_string());
        Ok(())
    }

    /// Removes a guild custom command, returning whether it existed.
    pub fn remove_custom(&self, guild: GuildId, name: &str) -> Result<bool, RegistryError> {
        if self.is_builtin(name) {
            return Err(RegistryError::Builtin(name.to_string()));
        }
        Ok(self.custom.remove(&(guild, name.to_string())).is_some())
    }

    /// Number of custom commands across all guilds.
    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    /// Loads persisted custom commands, skipping any that shadow built-ins.
    pub fn load_custom(&self, store: &DocumentStore) -> Result<usize, StoreError> {
        let mut loaded = 0;
        for (guild, cmds) in store.all_custom_commands()? {
            for (name, text) in cmds.0 {
                if self.set_custom(guild, &name, &text).is_ok() {
                    loaded += 1;
                }
            }
        }
        info!("Loaded {} custom commands", loaded);
        Ok(loaded)
    }

    /// A random command anyone may run, for "did you know" posts.
    pub fn random_public(&self) -> Option<&Command> {
        self.commands
            .values()
            .filter(|c| c.permission == Permission::Anyone)
            .choose(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> Command {
        Command::new(name, |_ctx| async { Ok(()) })
    }

    #[test]
    fn test_register_and_modules() {
        let mut registry = CommandRegistry::new();
        registry
            .register_all([
                noop("ping").module("utility"),
                noop("help").module("utility"),
                noop("kill").module("admin").permission(Permission::Administrator),
            ])
            .unwrap();

        assert_eq!(registry.modules().collect::<Vec<_>>(), ["admin", "utility"]);
        assert_eq!(registry.module_commands("utility").unwrap(), ["ping", "help"]);
        assert!(registry.module_commands("fun").is_none());
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("ping")).unwrap();
        assert_eq!(
            registry.register(noop("ping")).unwrap_err(),
            RegistryError::Duplicate("ping".into())
        );
    }

    #[test]
    fn test_resolve_builtin_before_custom() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("ping")).unwrap();
        let guild = GuildId(1);

        assert!(registry.set_custom(guild, "ping", "pong").is_err());
        registry.set_custom(guild, "rules", "Be nice").unwrap();

        assert!(matches!(registry.resolve(Some(guild), "ping"), Some(Resolved::Builtin(_))));
        match registry.resolve(Some(guild), "rules") {
            Some(Resolved::Custom(text)) => assert_eq!(text, "Be nice"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(registry.resolve(Some(GuildId(2)), "rules").is_none());
        assert!(registry.resolve(None, "rules").is_none());
    }

    #[test]
    fn test_custom_commands_answer_anywhere() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("ping")).unwrap();
        registry.register(noop("bot_en").anywhere()).unwrap();
        let guild = GuildId(1);
        registry.set_custom(guild, "rules", "Be nice").unwrap();

        let anywhere = |name| registry.resolve(Some(guild), name).unwrap().anywhere();
        assert!(!anywhere("ping"));
        assert!(anywhere("bot_en"));
        assert!(anywhere("rules"));
    }

    #[test]
    fn test_remove_custom() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("ping")).unwrap();
        registry.set_custom(GuildId(1), "rules", "x").unwrap();

        assert_eq!(registry.remove_custom(GuildId(1), "rules"), Ok(true));
        assert_eq!(registry.remove_custom(GuildId(1), "rules"), Ok(false));
        assert!(registry.remove_custom(GuildId(1), "ping").is_err());
    }

    #[test]
    fn test_load_custom_skips_builtins() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("ping")).unwrap();
        let store = DocumentStore::in_memory();
        store.set_custom_command(GuildId(1), "rules", "Be nice").unwrap();
        store.set_custom_command(GuildId(1), "ping", "shadow").unwrap();

        assert_eq!(registry.load_custom(&store).unwrap(), 1);
        assert_eq!(registry.custom_count(), 1);
    }

    #[test]
    fn test_random_public_only_picks_anyone() {
        let mut registry = CommandRegistry::new();
        registry
            .register_all([
                noop("kill").permission(Permission::Administrator),
                noop("bot.en").permission(Permission::Moderator),
                noop("ping"),
            ])
            .unwrap();
        for _ in 0..10 {
            assert_eq!(registry.random_public().unwrap().name, "ping");
        }
    }
}
