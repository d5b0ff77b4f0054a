use std::collections::HashMap;

use super::error::{Result, TwitchError};
use super::messages::{ChatMessageEvent, ChatTags};

/// A single parsed IRC line (IRCv3 tags included)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse one line, without the trailing CRLF
    pub fn parse(line: &str) -> Result<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        if rest.trim().is_empty() {
            return Err(TwitchError::IrcError("empty line".to_string()));
        }

        let mut tags = HashMap::new();
        if let Some(stripped) = rest.strip_prefix('@') {
            let (raw_tags, remainder) = stripped
                .split_once(' ')
                .ok_or_else(|| TwitchError::IrcError(format!("tags without command: {}", line)))?;
            for pair in raw_tags.split(';') {
                match pair.split_once('=') {
                    Some((key, value)) => tags.insert(key.to_string(), unescape_tag_value(value)),
                    None => tags.insert(pair.to_string(), String::new()),
                };
            }
            rest = remainder;
        }

        rest = rest.trim_start();
        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (raw_prefix, remainder) = stripped
                .split_once(' ')
                .ok_or_else(|| TwitchError::IrcError(format!("prefix without command: {}", line)))?;
            prefix = Some(raw_prefix.to_string());
            rest = remainder.trim_start();
        }

        let (command, mut rest) = match rest.split_once(' ') {
            Some((command, remainder)) => (command, remainder),
            None => (rest, ""),
        };
        if command.is_empty() {
            return Err(TwitchError::IrcError(format!("missing command: {}", line)));
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((param, remainder)) => {
                    params.push(param.to_string());
                    rest = remainder;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Ok(IrcMessage {
            tags,
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Nick part of the prefix (`nick!user@host`)
    pub fn nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|prefix| prefix.split('!').next().unwrap_or(prefix))
    }

    /// Convert a PRIVMSG into a chat event. `own_nick` marks messages we sent.
    pub fn into_chat_message(self, own_nick: &str) -> Option<ChatMessageEvent> {
        if self.command != "PRIVMSG" || self.params.len() < 2 {
            return None;
        }
        let login = self.nick()?.to_string();
        let tags = ChatTags::from_irc_tags(&self.tags, &login);
        let is_self = login.eq_ignore_ascii_case(own_nick);
        let mut params = self.params.into_iter();
        let channel = params.next()?;
        let text = params.next()?;

        Some(ChatMessageEvent {
            channel,
            login,
            tags,
            text: strip_action(text),
            is_self,
        })
    }
}

/// `/me` messages arrive wrapped in CTCP ACTION markers
fn strip_action(text: String) -> String {
    match text
        .strip_prefix("\u{1}ACTION ")
        .and_then(|inner| inner.strip_suffix('\u{1}'))
    {
        Some(inner) => inner.to_string(),
        None => text,
    }
}

/// Undo IRCv3 tag value escaping
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVMSG: &str = "@badge-info=;badges=moderator/1;color=#1E90FF;display-name=Viewer;emotes=25:0-4;id=abc-123;mod=1;subscriber=0;user-id=42 :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #somechannel :Kappa hello";

    #[test]
    fn test_parse_privmsg() {
        let msg = IrcMessage::parse(PRIVMSG).unwrap();
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.nick(), Some("viewer"));
        assert_eq!(msg.params, vec!["#somechannel", "Kappa hello"]);
        assert_eq!(msg.tags["display-name"], "Viewer");

        let chat = msg.into_chat_message("justinfan123").unwrap();
        assert_eq!(chat.channel, "#somechannel");
        assert_eq!(chat.login, "viewer");
        assert_eq!(chat.text, "Kappa hello");
        assert!(chat.tags.moderator);
        assert!(!chat.is_self);
        assert_eq!(chat.tags.emotes.unwrap()["25"][0].end, 4);
    }

    #[test]
    fn test_parse_ping() {
        let msg = IrcMessage::parse("PING :tmi.twitch.tv\r\n").unwrap();
        assert_eq!(msg.command, "PING");
        assert!(msg.prefix.is_none());
        assert_eq!(msg.params, vec!["tmi.twitch.tv"]);
    }

    #[test]
    fn test_parse_numeric_with_middle_params() {
        let msg = IrcMessage::parse(":tmi.twitch.tv 001 justinfan123 :Welcome, GLHF!").unwrap();
        assert_eq!(msg.command, "001");
        assert_eq!(msg.params, vec!["justinfan123", "Welcome, GLHF!"]);
    }

    #[test]
    fn test_unescape_tag_value() {
        assert_eq!(unescape_tag_value(r"hello\sworld\:\\"), "hello world;\\");
        assert_eq!(unescape_tag_value(r"trailing\"), "trailing");
    }

    #[test]
    fn test_action_and_self() {
        let line = ":bot!bot@bot.tmi.twitch.tv PRIVMSG #chan :\u{1}ACTION waves\u{1}";
        let chat = IrcMessage::parse(line)
            .unwrap()
            .into_chat_message("BOT")
            .unwrap();
        assert_eq!(chat.text, "waves");
        assert!(chat.is_self);
        assert_eq!(chat.tags.display_name, "bot");
    }

    #[test]
    fn test_rejects_empty_line() {
        assert!(IrcMessage::parse("   ").is_err());
    }
}
