//! Wire types exchanged with the scraper processes, plus the content rules
//! applied when a payload is turned into a Discord embed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sickle_common::utils::{chunk_chars, truncate_chars};

/// Embed description budget for relayed contents.
pub const MAX_CONTENT_CHARS: usize = 5700;
/// Embed field value limit.
pub const FIELD_CHARS: usize = 1023;
/// Colour of relayed posts.
pub const POST_COLOUR: u32 = 0x1a_bc_9c;
/// Colour of the first post of a thread.
pub const FIRST_POST_COLOUR: u32 = 0xee_ee_ee;

const OSU_BASE_URL: &str = "https://osu.ppy.sh";

/// Response envelope of every relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// `"ok"` or `"err"`.
    pub status: String,
    /// Optional detail, set on errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl Envelope {
    /// Success envelope.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            msg: None,
        }
    }

    /// Error envelope with a message.
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "err".to_string(),
            msg: Some(msg.into()),
        }
    }

    /// Whether the status is `"ok"`.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Body of `POST /admin/post`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPost {
    /// Text to relay.
    pub contents: String,
    /// Name of the sending process.
    pub src: String,
}

impl AdminPost {
    /// Keys that must be present in the JSON body.
    pub const REQUIRED_KEYS: &'static [&'static str] = &["contents", "src"];
}

/// Body of `POST /osu/post`: one scraped forum post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPost {
    /// Subforum id.
    #[serde(deserialize_with = "flexible_id")]
    pub subforum_id: String,
    /// Subforum display name.
    pub subforum_name: String,
    /// When the post was made, as scraped.
    pub post_date: String,
    /// Date of the previous post in the thread, if known.
    #[serde(default)]
    pub prev_post_date: Option<String>,
    /// Thread title.
    pub thread_title: String,
    /// Post id.
    #[serde(deserialize_with = "flexible_id")]
    pub post_id: String,
    /// Id of the post that opened the thread.
    #[serde(deserialize_with = "flexible_id")]
    pub first_post_id: String,
    /// Author name.
    pub username: String,
    /// Author id.
    #[serde(deserialize_with = "flexible_id")]
    pub user_id: String,
    /// Author avatar, possibly relative for guests.
    pub avatar_url: String,
    /// Post body.
    pub contents: String,
}

impl ForumPost {
    /// Keys that must be present in the JSON body.
    pub const REQUIRED_KEYS: &'static [&'static str] = &[
        "subforum_id",
        "subforum_name",
        "post_date",
        "prev_post_date",
        "thread_title",
        "post_id",
        "first_post_id",
        "username",
        "user_id",
        "avatar_url",
        "contents",
    ];

    /// Link to the post on the forum.
    pub fn post_url(&self) -> String {
        format!("{OSU_BASE_URL}/community/forums/posts/{}", self.post_id)
    }

    /// Link to the author's profile.
    pub fn user_url(&self) -> String {
        format!("{OSU_BASE_URL}/users/{}", self.user_id)
    }

    /// Avatar URL, with relative guest avatars made absolute.
    pub fn avatar(&self) -> String {
        if self.avatar_url.contains("avatar-guest") && !self.avatar_url.starts_with("http") {
            format!("{OSU_BASE_URL}/{}", self.avatar_url.trim_start_matches('/'))
        } else {
            self.avatar_url.clone()
        }
    }

    /// Whether this post opened its thread.
    pub fn is_first_post(&self) -> bool {
        self.post_id == self.first_post_id
    }

    /// Embed colour for this post.
    pub fn colour(&self) -> u32 {
        if self.is_first_post() {
            FIRST_POST_COLOUR
        } else {
            POST_COLOUR
        }
    }
}

/// A validated payload forwarded from the relay server to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// Text for the debug channel.
    Admin(AdminPost),
    /// A forum post for the feed channel.
    Forum(Box<ForumPost>),
}

impl RelayEvent {
    /// Route the event arrived on, for logging.
    pub fn route(&self) -> &'static str {
        match self {
            RelayEvent::Admin(_) => "/admin/post",
            RelayEvent::Forum(_) => "/osu/post",
        }
    }
}

/// Required keys absent from a JSON object. A non-object is missing all of them.
pub fn missing_keys<'a>(body: &Value, required: &[&'a str]) -> Vec<&'a str> {
    match body.as_object() {
        Some(map) => required
            .iter()
            .filter(|key| !map.contains_key(**key))
            .copied()
            .collect(),
        None => required.to_vec(),
    }
}

/// Truncates relayed contents and splits them into embed field values.
pub fn content_chunks(contents: &str) -> Vec<String> {
    chunk_chars(truncate_chars(contents, MAX_CONTENT_CHARS), FIELD_CHARS)
}

fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_json() -> Value {
        json!({
            "subforum_id": 52,
            "subforum_name": "Off-Topic",
            "post_date": "2024-09-22 10:00:00",
            "prev_post_date": null,
            "thread_title": "Hello",
            "post_id": 9001,
            "first_post_id": "9001",
            "username": "peppy",
            "user_id": 2,
            "avatar_url": "images/layout/avatar-guest.png",
            "contents": "first!"
        })
    }

    #[test]
    fn test_forum_post_accepts_numeric_and_string_ids() {
        let post: ForumPost = serde_json::from_value(post_json()).unwrap();
        assert_eq!(post.subforum_id, "52");
        assert!(post.is_first_post());
        assert_eq!(post.colour(), FIRST_POST_COLOUR);
        assert_eq!(post.post_url(), "https://osu.ppy.sh/community/forums/posts/9001");
        assert_eq!(post.user_url(), "https://osu.ppy.sh/users/2");
        assert_eq!(
            post.avatar(),
            "https://osu.ppy.sh/images/layout/avatar-guest.png"
        );
    }

    #[test]
    fn test_regular_avatar_is_untouched() {
        let mut post: ForumPost = serde_json::from_value(post_json()).unwrap();
        post.avatar_url = "https://a.ppy.sh/2".into();
        post.first_post_id = "1".into();
        assert_eq!(post.avatar(), "https://a.ppy.sh/2");
        assert_eq!(post.colour(), POST_COLOUR);
    }

    #[test]
    fn test_missing_keys() {
        let mut body = post_json();
        body.as_object_mut().unwrap().remove("contents");
        body.as_object_mut().unwrap().remove("user_id");
        assert_eq!(
            missing_keys(&body, ForumPost::REQUIRED_KEYS),
            vec!["user_id", "contents"]
        );
        assert_eq!(missing_keys(&json!([1]), AdminPost::REQUIRED_KEYS).len(), 2);
        assert!(missing_keys(&post_json(), ForumPost::REQUIRED_KEYS).is_empty());
    }

    #[test]
    fn test_content_chunks_truncate_then_split() {
        let chunks = content_chunks(&"x".repeat(8000));
        assert_eq!(chunks.len(), 6);
        assert_eq!(chunks.iter().map(String::len).sum::<usize>(), MAX_CONTENT_CHARS);
        assert!(content_chunks("").is_empty());
    }

    #[test]
    fn test_envelope_serialization() {
        assert_eq!(serde_json::to_value(Envelope::ok()).unwrap(), json!({"status": "ok"}));
        assert_eq!(
            serde_json::to_value(Envelope::err("bad")).unwrap(),
            json!({"status": "err", "msg": "bad"})
        );
    }
}
