//! RFC 1459 case mapping for nicks and channel names.

fn fold(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        c => c.to_ascii_lowercase(),
    }
}

/// Lower-case `name` under RFC 1459 rules.
pub fn irc_lower(name: &str) -> String {
    name.chars().map(fold).collect()
}

/// Compare two names under RFC 1459 rules.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.chars().map(fold).eq(b.chars().map(fold))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc1459_casemapping() {
        assert!(irc_eq("Bot[1]", "bot{1}"));
        assert!(irc_eq("a\\b", "A|B"));
        assert!(irc_eq("nick~", "NICK^"));
        assert!(!irc_eq("bot", "bot_"));
        assert_eq!(irc_lower("#Rust[Dev]"), "#rust{dev}");
    }
}
