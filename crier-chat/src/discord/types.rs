use serde::{Deserialize, Serialize};

use crate::traits::PostCard;

/// Accent colour for announcement embeds (the feed's brand blue).
pub const EMBED_ACCENT: u32 = 0x1DA1F2;

/// Response of `GET /users/@me` under bot auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}

/// Response of `GET /channels/{id}`. Ids arrive as decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelObject {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<u8>,
}

/// Body of `POST /channels/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessage {
    pub embeds: Vec<Embed>,
}

/// Response of a successful message create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageObject {
    pub id: String,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// RFC 3339; Discord renders it in the viewer's locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
}

impl From<&PostCard> for Embed {
    fn from(card: &PostCard) -> Self {
        Embed {
            title: Some(card.title.clone()),
            description: Some(card.body.clone()),
            url: Some(card.permalink.clone()),
            color: Some(EMBED_ACCENT),
            timestamp: card.timestamp.map(|ts| ts.to_rfc3339()),
            author: Some(EmbedAuthor {
                name: card.author.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_card() -> PostCard {
        PostCard {
            title: "New tweet from @alpha".to_string(),
            body: "hello world".to_string(),
            permalink: "https://twitter.com/alpha/status/6".to_string(),
            author: "@alpha".to_string(),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn embed_carries_card_fields() {
        let embed = Embed::from(&sample_card());
        assert_eq!(embed.title.as_deref(), Some("New tweet from @alpha"));
        assert_eq!(embed.description.as_deref(), Some("hello world"));
        assert_eq!(
            embed.url.as_deref(),
            Some("https://twitter.com/alpha/status/6")
        );
        assert_eq!(embed.color, Some(EMBED_ACCENT));
        assert_eq!(embed.timestamp.as_deref(), Some("2024-05-01T12:00:00+00:00"));
    }

    #[test]
    fn embed_omits_absent_timestamp_in_json() {
        let mut card = sample_card();
        card.timestamp = None;
        let payload = serde_json::to_value(Embed::from(&card)).unwrap();
        assert!(payload.get("timestamp").is_none());
        assert_eq!(payload["author"]["name"], "@alpha");
    }
}
