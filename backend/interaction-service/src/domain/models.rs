use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Name shown for commenters whose identity carries no display name
pub const ANONYMOUS_NAME: &str = "Anonymous User";

/// Caller identity as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub photo: Option<String>,
    pub is_admin: bool,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            name: None,
            photo: None,
            is_admin: false,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(ANONYMOUS_NAME)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    Draft,
    #[default]
    Published,
    /// Any status this service does not act on, e.g. `archived`
    #[serde(other)]
    Unknown,
}

/// Aggregate counters stored on a blog record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogCounters {
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub comments_count: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub saves_count: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub views: i64,
}

impl BlogCounters {
    pub fn get(&self, field: CounterField) -> i64 {
        match field {
            CounterField::Likes => self.likes,
            CounterField::CommentsCount => self.comments_count,
            CounterField::SavesCount => self.saves_count,
            CounterField::Views => self.views,
        }
    }

    pub fn set(&mut self, field: CounterField, value: i64) {
        let slot = match field {
            CounterField::Likes => &mut self.likes,
            CounterField::CommentsCount => &mut self.comments_count,
            CounterField::SavesCount => &mut self.saves_count,
            CounterField::Views => &mut self.views,
        };
        *slot = value.max(0);
    }
}

/// Blog record. Content fields are owned by the blog editor and kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub status: BlogStatus,
    #[serde(flatten)]
    pub counters: BlogCounters,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

/// Counter fields maintained on `blogs/{blogId}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterField {
    Likes,
    SavesCount,
    CommentsCount,
    Views,
}

impl CounterField {
    pub const ALL: [CounterField; 4] = [
        CounterField::Likes,
        CounterField::SavesCount,
        CounterField::CommentsCount,
        CounterField::Views,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CounterField::Likes => "likes",
            CounterField::SavesCount => "savesCount",
            CounterField::CommentsCount => "commentsCount",
            CounterField::Views => "views",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }

    /// Counters that mirror a child relation collection
    pub fn is_relation_counter(&self) -> bool {
        !matches!(self, CounterField::Views)
    }
}

impl std::fmt::Display for CounterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user relations keyed by `(blogId, userId)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Like,
    Save,
}

impl RelationKind {
    pub fn collection(&self) -> &'static str {
        match self {
            RelationKind::Like => "likes",
            RelationKind::Save => "saves",
        }
    }

    pub fn counter(&self) -> CounterField {
        match self {
            RelationKind::Like => CounterField::Likes,
            RelationKind::Save => CounterField::SavesCount,
        }
    }

    pub fn from_collection(name: &str) -> Option<Self> {
        match name {
            "likes" => Some(RelationKind::Like),
            "saves" => Some(RelationKind::Save),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationKind::Like => f.write_str("like"),
            RelationKind::Save => f.write_str("save"),
        }
    }
}

/// A like or save. Existence of the record is the "active" fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRecord {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
}

/// A comment on a blog. `id` is the store key and is not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_photo: Option<String>,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub is_edited: bool,
}

impl Comment {
    /// Stored shape of the comment, without the key
    pub fn to_record(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("id");
        }
        Ok(value)
    }
}

/// Result of a like/save toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// Relation state after the toggle
    pub active: bool,
    /// Counter value after maintenance; `None` when it could not be updated
    pub count: Option<i64>,
}

/// Counters as non-negative integers, tolerating missing or malformed values
fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_of(&value))
}

/// Integer view of a stored counter; anything else reads as 0
pub fn count_of(value: &Value) -> i64 {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .unwrap_or(0)
        .max(0)
}
