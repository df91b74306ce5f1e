//! Frames exchanged with connections. Every frame is `{"event": name, "data": payload}`.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{CursorState, Participant, RoomKey};

/// A drawing payload checked against `T` but relayed exactly as it arrived,
/// unknown fields and number formatting included.
#[derive(Debug, Clone, PartialEq)]
pub struct Verbatim<T> {
    raw: Map<String, Value>,
    parsed: T,
}

impl<T> Verbatim<T> {
    pub fn get(&self) -> &T {
        &self.parsed
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

impl<T: Serialize + DeserializeOwned> Verbatim<T> {
    pub fn from_payload(parsed: &T) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::to_value(parsed)?)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Verbatim<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let parsed = T::deserialize(&value).map_err(D::Error::custom)?;
        match value {
            Value::Object(raw) => Ok(Self { raw, parsed }),
            _ => Err(D::Error::custom("payload must be an object")),
        }
    }
}

impl<T> Serialize for Verbatim<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room_id: RoomKey,
    pub username: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeKind {
    Start,
    Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub kind: StrokeKind,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub width: f64,
    pub tool: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    /// Rendering hint such as `rectangle` or `arrow`; not interpreted here.
    pub shape_kind: String,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub font_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Self-contained encoded raster, usually a data URL.
    pub encoded_image: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorMove {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum InboundEvent {
    JoinRoom(JoinRoom),
    LeaveRoom,
    Draw(Verbatim<Stroke>),
    DrawShape(Verbatim<Shape>),
    DrawText(Verbatim<Text>),
    DrawImage(Verbatim<Image>),
    CursorMove(CursorMove),
    ClearCanvas,
    SaveCanvas(String),
    RequestCanvasState,
    Ping(Ping),
}

impl InboundEvent {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeft {
    pub user_id: crate::ConnectionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    pub snapshot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundEvent {
    UsersUpdate(Vec<Participant>),
    CursorMove(CursorState),
    UserLeft(UserLeft),
    CanvasState(CanvasState),
    Draw(Verbatim<Stroke>),
    DrawShape(Verbatim<Shape>),
    DrawText(Verbatim<Text>),
    DrawImage(Verbatim<Image>),
    ClearCanvas,
    Pong(Ping),
}

impl OutboundEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
