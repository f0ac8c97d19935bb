//! Integration tests for sickle-commands crate.

use sickle_commands::commands::reminders::{parse_duration, DurationError};
use sickle_commands::{
    all_commands, parse_invocation, CommandRegistry, Permission, RegistryError, Resolved,
};
use sickle_common::test_utils::{create_temp_dir, init_test_logging};
use sickle_common::GuildId;
use sickle_store::DocumentStore;

fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register_all(all_commands()).unwrap();
    registry
}

#[test]
fn test_builtin_table_is_complete() {
    let registry = registry();
    for name in [
        "help", "commands", "ping", "bot.en", "bot.set.ch", "bot.get.ch", "bot.cmd.set",
        "bot.cmd.rmv", "createrole", "destroyrole", "addselfrole", "delselfrole", "togglerole",
        "selfroles", "roles", "remind", "reminders", "remind.rmv", "bot.forum", "kill",
        "feed.ping", "bot.stats", "cmd.stats.all", "cmd.set.info", "bot.set.dbg",
    ] {
        assert!(registry.is_builtin(name), "{name} is not registered");
    }
    assert_eq!(
        registry.modules().collect::<Vec<_>>(),
        ["admin", "bots", "moderation", "reminders", "roles", "utility"]
    );
}

#[test]
fn test_registering_twice_fails() {
    let mut registry = registry();
    let err = registry.register_all(all_commands()).unwrap_err();
    assert!(matches!(err, RegistryError::Duplicate(_)));
}

#[test]
fn test_permission_levels() {
    let registry = registry();
    assert_eq!(registry.get("kill").unwrap().permission, Permission::Administrator);
    assert_eq!(registry.get("bot.cmd.set").unwrap().permission, Permission::Moderator);
    assert_eq!(registry.get("remind").unwrap().permission, Permission::Anyone);
    assert!(registry.get("bot.en").unwrap().anywhere);
}

#[test]
fn test_message_to_command_lookup() {
    let registry = registry();
    let guild = GuildId(42);
    registry.set_custom(guild, "rules", "Be nice").unwrap();

    let invocation = parse_invocation("<<", "<<remind 10m tea").unwrap();
    match registry.resolve(Some(guild), &invocation.name) {
        Some(Resolved::Builtin(command)) => assert_eq!(command.module, "reminders"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(parse_duration(&invocation.args[0]).unwrap().num_minutes(), 10);

    let invocation = parse_invocation("<<", "<<rules").unwrap();
    assert!(matches!(
        registry.resolve(Some(guild), &invocation.name),
        Some(Resolved::Custom(text)) if text == "Be nice"
    ));

    let invocation = parse_invocation("<<", "<<nothing here").unwrap();
    assert!(registry.resolve(Some(guild), &invocation.name).is_none());
}

#[test]
fn test_custom_commands_survive_restart() {
    init_test_logging();
    let dir = create_temp_dir();
    let path = dir.path().join("db.json");
    let guild = GuildId(7);

    {
        let store = DocumentStore::open(&path).unwrap();
        store.set_custom_command(guild, "rules", "Be nice").unwrap();
        store.set_custom_command(guild, "help", "shadowed").unwrap();
    }

    let store = DocumentStore::open(&path).unwrap();
    let registry = registry();
    assert_eq!(registry.load_custom(&store).unwrap(), 1);
    assert!(matches!(
        registry.resolve(Some(guild), "rules"),
        Some(Resolved::Custom(_))
    ));
    assert!(matches!(
        registry.resolve(Some(guild), "help"),
        Some(Resolved::Builtin(_))
    ));
}

#[test]
fn test_custom_command_guard() {
    let registry = registry();
    assert_eq!(
        registry.set_custom(GuildId(1), "kill", "nope"),
        Err(RegistryError::Builtin("kill".into()))
    );
    assert_eq!(
        registry.remove_custom(GuildId(1), "ping"),
        Err(RegistryError::Builtin("ping".into()))
    );
}

#[test]
fn test_reminder_limits() {
    assert!(parse_duration("365d").is_ok());
    assert_eq!(parse_duration("400d"), Err(DurationError::TooLong));
}
