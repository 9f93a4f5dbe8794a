use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    TextHeader,
    JitsiRoom,
    PlayAudio,
    OpenTab,
}

impl PropertyKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "textHeader" => Some(Self::TextHeader),
            "jitsiRoom" => Some(Self::JitsiRoom),
            "playAudio" => Some(Self::PlayAudio),
            "openTab" => Some(Self::OpenTab),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::TextHeader => "textHeader",
            Self::JitsiRoom => "jitsiRoom",
            Self::PlayAudio => "playAudio",
            Self::OpenTab => "openTab",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JitsiRoomProperty {
    pub button_label: String,
    pub room_name: String,
    #[serde(default = "empty_object")]
    pub jitsi_room_config: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAudioProperty {
    pub button_label: String,
    pub audio_link: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTabProperty {
    pub button_label: String,
    pub link: String,
    #[serde(default)]
    pub in_new_tab: bool,
    #[serde(default)]
    pub allow_api: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Typed view over one entity property.
///
/// Unknown keys, and known keys whose value does not have the expected
/// shape, are kept verbatim in `Opaque` so other layers can own them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyPayload {
    TextHeader(String),
    JitsiRoom(JitsiRoomProperty),
    PlayAudio(PlayAudioProperty),
    OpenTab(OpenTabProperty),
    Opaque(Value),
}

impl PropertyPayload {
    /// `null` decodes to no payload at all.
    pub fn decode(key: &str, value: Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        let payload = match PropertyKind::from_key(key) {
            Some(PropertyKind::TextHeader) => match value {
                Value::String(text) => Self::TextHeader(text),
                other => Self::Opaque(other),
            },
            Some(PropertyKind::JitsiRoom) => decode_typed(key, value, Self::JitsiRoom),
            Some(PropertyKind::PlayAudio) => decode_typed(key, value, Self::PlayAudio),
            Some(PropertyKind::OpenTab) => decode_typed(key, value, Self::OpenTab),
            None => Self::Opaque(value),
        };
        Some(payload)
    }

    pub fn kind(&self) -> Option<PropertyKind> {
        match self {
            Self::TextHeader(_) => Some(PropertyKind::TextHeader),
            Self::JitsiRoom(_) => Some(PropertyKind::JitsiRoom),
            Self::PlayAudio(_) => Some(PropertyKind::PlayAudio),
            Self::OpenTab(_) => Some(PropertyKind::OpenTab),
            Self::Opaque(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        // Payloads only hold JSON-native data, so this cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Mirrors how map data treats property values: empty text, `false`,
    /// zero and `null` count as unset.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::TextHeader(text) => !text.is_empty(),
            Self::JitsiRoom(_) | Self::PlayAudio(_) | Self::OpenTab(_) => true,
            Self::Opaque(value) => match value {
                Value::Null => false,
                Value::Bool(flag) => *flag,
                Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
                Value::String(text) => !text.is_empty(),
                Value::Array(_) | Value::Object(_) => true,
            },
        }
    }
}

fn decode_typed<T: DeserializeOwned>(
    key: &str,
    value: Value,
    wrap: fn(T) -> PropertyPayload,
) -> PropertyPayload {
    match T::deserialize(&value) {
        Ok(typed) => wrap(typed),
        Err(error) => {
            debug!(key, error = %error, "property_payload_kept_opaque");
            PropertyPayload::Opaque(value)
        }
    }
}

/// Merges `patch` into `target`. Objects merge field by field; everything
/// else, arrays included, replaces the target value.
pub(crate) fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// Entity properties in insertion order. Keys are unique; a key keeps the
/// position of its first insertion.
///
/// Each entry keeps the JSON it was given next to its typed view, so
/// encoding returns exactly what map data stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PropertyRegistry {
    entries: Vec<PropertyEntry>,
}

#[derive(Debug, Clone, PartialEq)]
struct PropertyEntry {
    key: String,
    raw: Value,
    payload: Option<PropertyPayload>,
}

impl PropertyEntry {
    fn from_raw(key: String, raw: Value) -> Self {
        let payload = PropertyPayload::decode(&key, raw.clone());
        Self { key, raw, payload }
    }
}

impl PropertyRegistry {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyPayload> {
        self.position(key)
            .and_then(|index| self.entries[index].payload.as_ref())
    }

    /// Stored JSON for `key`, untouched by decoding.
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|index| &self.entries[index].raw)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&PropertyPayload>)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.payload.as_ref()))
    }

    pub fn set(&mut self, key: impl Into<String>, payload: Option<PropertyPayload>) {
        let raw = payload
            .as_ref()
            .map(PropertyPayload::to_value)
            .unwrap_or(Value::Null);
        self.insert(PropertyEntry {
            key: key.into(),
            raw,
            payload,
        });
    }

    pub fn set_json(&mut self, key: impl Into<String>, value: Value) {
        self.insert(PropertyEntry::from_raw(key.into(), value));
    }

    /// Deep-merges each value into the stored JSON of its key, then decodes
    /// the result again.
    pub fn merge(&mut self, partial: Map<String, Value>) {
        for (key, patch) in partial {
            match self.position(&key) {
                Some(index) => {
                    let mut merged = std::mem::take(&mut self.entries[index].raw);
                    merge_json(&mut merged, patch);
                    self.entries[index] = PropertyEntry::from_raw(key, merged);
                }
                None => self.entries.push(PropertyEntry::from_raw(key, patch)),
            }
        }
    }

    pub fn text_header(&self) -> &str {
        match self.get(PropertyKind::TextHeader.key()) {
            Some(PropertyPayload::TextHeader(text)) => text,
            _ => "",
        }
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.raw.clone()))
            .collect()
    }

    fn insert(&mut self, entry: PropertyEntry) {
        match self.position(&entry.key) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key == key)
    }
}

impl From<Map<String, Value>> for PropertyRegistry {
    fn from(raw: Map<String, Value>) -> Self {
        let mut registry = Self::default();
        registry.merge(raw);
        registry
    }
}

impl From<PropertyRegistry> for Map<String, Value> {
    fn from(registry: PropertyRegistry) -> Self {
        registry.to_json()
    }
}
