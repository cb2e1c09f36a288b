//! Gateway intents derived from subscribed event names

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GatewayIntents(u32);

impl GatewayIntents {
    pub const GUILDS: Self = Self(1 << 0);
    pub const GUILD_MEMBERS: Self = Self(1 << 1);
    pub const GUILD_BANS: Self = Self(1 << 2);
    pub const GUILD_EMOJIS: Self = Self(1 << 3);
    pub const GUILD_INTEGRATIONS: Self = Self(1 << 4);
    pub const GUILD_WEBHOOKS: Self = Self(1 << 5);
    pub const GUILD_INVITES: Self = Self(1 << 6);
    pub const GUILD_VOICE_STATES: Self = Self(1 << 7);
    pub const GUILD_PRESENCES: Self = Self(1 << 8);
    pub const GUILD_MESSAGES: Self = Self(1 << 9);
    pub const GUILD_MESSAGE_REACTIONS: Self = Self(1 << 10);
    pub const GUILD_MESSAGE_TYPING: Self = Self(1 << 11);
    pub const DIRECT_MESSAGES: Self = Self(1 << 12);
    pub const DIRECT_MESSAGE_REACTIONS: Self = Self(1 << 13);
    pub const DIRECT_MESSAGE_TYPING: Self = Self(1 << 14);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for GatewayIntents {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for GatewayIntents {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Display for GatewayIntents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The intent an event requires, if any.
pub fn intent_for(event: &str) -> Option<GatewayIntents> {
    let intent = match event {
        "channelCreate" | "channelDelete" | "channelPinsUpdate" | "channelUpdate" => GatewayIntents::GUILDS,
        "guildCreate" | "guildDelete" | "guildUnavailable" | "guildUpdate" => GatewayIntents::GUILDS,
        "roleCreate" | "roleDelete" | "roleUpdate" => GatewayIntents::GUILDS,
        "emojiCreate" | "emojiDelete" | "emojiUpdate" => GatewayIntents::GUILD_EMOJIS,
        "guildBanAdd" | "guildBanRemove" => GatewayIntents::GUILD_BANS,
        "guildIntegrationsUpdate" => GatewayIntents::GUILD_INTEGRATIONS,
        "guildMemberAdd" | "guildMemberRemove" | "guildMembersChunk" | "guildMemberUpdate" => {
            GatewayIntents::GUILD_MEMBERS
        }
        "guildMemberSpeaking" | "voiceStateUpdate" => GatewayIntents::GUILD_VOICE_STATES,
        "inviteCreate" | "inviteDelete" => GatewayIntents::GUILD_INVITES,
        "message" | "messageCreate" | "messageDelete" | "messageDeleteBulk" | "messageUpdate" => {
            GatewayIntents::GUILD_MESSAGES
        }
        "messageReactionAdd"
        | "messageReactionRemove"
        | "messageReactionRemoveAll"
        | "messageReactionRemoveEmoji" => GatewayIntents::GUILD_MESSAGE_REACTIONS,
        "presenceUpdate" | "userUpdate" => GatewayIntents::GUILD_PRESENCES,
        "typingStart" => GatewayIntents::GUILD_MESSAGE_TYPING,
        "webhookUpdate" => GatewayIntents::GUILD_WEBHOOKS,
        _ => return None,
    };
    Some(intent)
}

/// Minimal intent set for `events`. With `dms`, guild message intents pull in
/// their direct-message counterparts.
pub fn calculate<I, S>(events: I, dms: bool) -> GatewayIntents
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut intents = events
        .into_iter()
        .filter_map(|event| intent_for(event.as_ref()))
        .fold(GatewayIntents::empty(), |acc, intent| acc | intent);

    if dms {
        let pairs = [
            (GatewayIntents::GUILD_MESSAGES, GatewayIntents::DIRECT_MESSAGES),
            (GatewayIntents::GUILD_MESSAGE_REACTIONS, GatewayIntents::DIRECT_MESSAGE_REACTIONS),
            (GatewayIntents::GUILD_MESSAGE_TYPING, GatewayIntents::DIRECT_MESSAGE_TYPING),
        ];
        for (guild, direct) in pairs {
            if intents.contains(guild) {
                intents |= direct;
            }
        }
    }
    intents
}
