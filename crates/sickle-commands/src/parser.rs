//! Prefix command parsing.

/// A parsed `<prefix><name> <args...>` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Command name, directly after the prefix.
    pub name: String,
    /// Whitespace-separated arguments.
    pub args: Vec<String>,
}

/// Parses `content` as a command invocation.
///
/// Returns `None` when the content does not start with `prefix` or no name
/// follows it directly. Any run of prefix characters after the prefix is
/// dropped, so `<<<ping` names `ping`.
pub fn parse_invocation(prefix: &str, content: &str) -> Option<Invocation> {
    if prefix.is_empty() {
        return None;
    }
    let rest = content
        .strip_prefix(prefix)?
        .trim_start_matches(|c| prefix.contains(c));
    if rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?.to_string();
    Some(Invocation {
        name,
        args: tokens.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_args() {
        let invocation = parse_invocation("<<", "<<remind  10m   stretch legs").unwrap();
        assert_eq!(invocation.name, "remind");
        assert_eq!(invocation.args, ["10m", "stretch", "legs"]);
    }

    #[test]
    fn test_parse_without_args() {
        let invocation = parse_invocation("<<", "<<ping").unwrap();
        assert_eq!(invocation.name, "ping");
        assert!(invocation.args.is_empty());
    }

    #[test]
    fn test_dotted_names_are_kept_whole() {
        let invocation = parse_invocation("!", "!bot.set.ch").unwrap();
        assert_eq!(invocation.name, "bot.set.ch");
    }

    #[test]
    fn test_rejects_non_commands() {
        assert_eq!(parse_invocation("<<", "hello <<ping"), None);
        assert_eq!(parse_invocation("<<", "<<"), None);
        assert_eq!(parse_invocation("<<", "<< ping"), None);
        assert_eq!(parse_invocation("", "ping"), None);
    }

    #[test]
    fn test_multichar_prefix_must_match_fully() {
        assert_eq!(parse_invocation("<<", "<ping"), None);
    }

    #[test]
    fn test_repeated_prefix_characters_are_stripped() {
        assert_eq!(parse_invocation("<<", "<<<ping").unwrap().name, "ping");
        assert_eq!(parse_invocation("!", "!!!help roles").unwrap().name, "help");
        assert_eq!(parse_invocation("<<", "<<<<"), None);
    }
}
