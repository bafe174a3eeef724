use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// What a toggle edge points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Video,
    Comment,
    Channel,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Video => "video",
            TargetKind::Comment => "comment",
            TargetKind::Channel => "channel",
        }
    }

    /// Videos and comments are liked, channels are subscribed to.
    pub fn relation(self) -> Relation {
        match self {
            TargetKind::Video | TargetKind::Comment => Relation::Like,
            TargetKind::Channel => Relation::Subscribe,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(TargetKind::Video),
            "comment" => Ok(TargetKind::Comment),
            "channel" => Ok(TargetKind::Channel),
            other => Err(format!("unknown target kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Like,
    Subscribe,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Like => "like",
            Relation::Subscribe => "subscribe",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Relation::Like),
            "subscribe" => Ok(Relation::Subscribe),
            other => Err(format!("unknown relation '{}'", other)),
        }
    }
}

/// The (principal, target, relation) tuple. At most one edge exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub principal_id: Uuid,
    pub target_kind: TargetKind,
    pub target_id: Uuid,
    pub relation: Relation,
}

impl EdgeKey {
    pub fn new(principal_id: Uuid, target_kind: TargetKind, target_id: Uuid) -> Self {
        Self {
            principal_id,
            target_kind,
            target_id,
            relation: target_kind.relation(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleEdge {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub target_kind: TargetKind,
    pub target_id: Uuid,
    pub relation: Relation,
    pub created_at: DateTime<Utc>,
}

impl ToggleEdge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            principal_id: self.principal_id,
            target_kind: self.target_kind,
            target_id: self.target_id,
            relation: self.relation,
        }
    }
}
