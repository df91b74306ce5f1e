use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Image, Shape, Stroke, Text};
use crate::ConnectionId;

/// Where an image was placed. The encoded bytes are never retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<&Image> for ImagePlacement {
    fn from(image: &Image) -> Self {
        Self {
            x: image.x,
            y: image.y,
            width: image.width,
            height: image.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DrawOperation {
    Stroke(Stroke),
    Shape(Shape),
    Text(Text),
    Image(ImagePlacement),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub operation: DrawOperation,
    pub timestamp: DateTime<Utc>,
    pub user_id: ConnectionId,
    pub username: String,
}

/// Append-only record of drawing operations, bounded to `limit` entries by
/// discarding the oldest ones.
#[derive(Debug)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl HistoryLog {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter()
    }
}
