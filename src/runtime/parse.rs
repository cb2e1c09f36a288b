//! Turning message text into a command token

use async_trait::async_trait;
use crate::core::command::ParsedCommand;
use crate::core::context::Context;
use crate::core::event::Message;
use crate::error::Result;

/// Extracts a command from a message, if it carries one.
#[async_trait]
pub trait Parser: Send + Sync + 'static {
    async fn parse(&self, ctx: &Context, message: &Message) -> Result<Option<ParsedCommand>>;
}

/// Accepts the configured prefix or a leading mention of the current user.
/// Messages from bots are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixParser;

impl PrefixParser {
    fn strip<'a>(content: &'a str, prefix: &str, self_id: Option<&str>) -> Option<&'a str> {
        if !prefix.is_empty() {
            if let Some(rest) = content.strip_prefix(prefix) {
                return Some(rest);
            }
        }
        let id = self_id?;
        content
            .strip_prefix(format!("<@{}>", id).as_str())
            .or_else(|| content.strip_prefix(format!("<@!{}>", id).as_str()))
    }

    /// Parse without consulting a platform.
    pub fn parse_content(content: &str, prefix: &str, self_id: Option<&str>) -> Option<ParsedCommand> {
        let rest = Self::strip(content, prefix, self_id)?.trim();
        let (command, suffix) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return None;
        }
        Some(ParsedCommand::new(command, suffix))
    }
}

#[async_trait]
impl Parser for PrefixParser {
    async fn parse(&self, ctx: &Context, message: &Message) -> Result<Option<ParsedCommand>> {
        if message.author.bot {
            return Ok(None);
        }
        let me = ctx.platform().current_user();
        let self_id = me.as_ref().map(|user| user.id.as_str());
        Ok(Self::parse_content(&message.content, &ctx.config().prefix, self_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::User;
    use crate::testing::{message, test_context};

    #[test]
    fn test_prefix_and_suffix() {
        let parsed = PrefixParser::parse_content("!Roll 2d6  +  3", "!", None).unwrap();
        assert_eq!(parsed.command, "roll");
        assert_eq!(parsed.suffix, "2d6  +  3");
        assert_eq!(parsed.params, vec!["2d6", "+", "3"]);

        assert!(PrefixParser::parse_content("hello", "!", None).is_none());
        assert!(PrefixParser::parse_content("!", "!", None).is_none());
        assert!(PrefixParser::parse_content("!   ", "!", None).is_none());
    }

    #[test]
    fn test_mentions() {
        let plain = PrefixParser::parse_content("<@99> ping now", "!", Some("99")).unwrap();
        assert_eq!(plain.command, "ping");
        assert_eq!(plain.suffix, "now");

        let nick = PrefixParser::parse_content("<@!99>ping", "!", Some("99")).unwrap();
        assert_eq!(nick.command, "ping");

        assert!(PrefixParser::parse_content("<@12> ping", "!", Some("99")).is_none());
        assert!(PrefixParser::parse_content("<@99> ping", "!", None).is_none());
    }

    #[tokio::test]
    async fn test_bots_are_ignored() {
        let (ctx, _, _) = test_context();
        let human = message("u1", "!ping");
        assert!(PrefixParser.parse(&ctx, &human).await.unwrap().is_some());

        let bot = Message::new(User::new("b1", "robot").as_bot(), "c1", "!ping");
        assert!(PrefixParser.parse(&ctx, &bot).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mention_of_current_user() {
        let (ctx, platform, _) = test_context();
        platform.set_user(User::new("99", "augur").as_bot());
        let parsed = PrefixParser.parse(&ctx, &message("u1", "<@99> help me")).await.unwrap();
        assert_eq!(parsed.map(|p| p.command), Some("help".to_string()));
    }
}
