use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Record type requested on the route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    /// Resolve the free-form route segment ("movies", "Series", "anime", ...)
    pub fn from_route(value: &str) -> Option<Self> {
        let lower = value.to_lowercase();
        if lower.contains("movie") {
            Some(Self::Movie)
        } else if lower.contains("series") || lower.contains("anime") {
            Some(Self::Series)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Series => write!(f, "series"),
        }
    }
}

/// Video resolution tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "2160p")]
    P2160,
    #[serde(rename = "4K")]
    Uhd4k,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Default for Quality {
    fn default() -> Self {
        Self::Unknown
    }
}

impl Quality {
    /// Parse a matched token, case-insensitively
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "480p" => Some(Self::P480),
            "720p" => Some(Self::P720),
            "1080p" => Some(Self::P1080),
            "2160p" => Some(Self::P2160),
            "4k" => Some(Self::Uhd4k),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::P480 => "480p",
            Quality::P720 => "720p",
            Quality::P1080 => "1080p",
            Quality::P2160 => "2160p",
            Quality::Uhd4k => "4K",
            Quality::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release source tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "BluRay")]
    BluRay,
    #[serde(rename = "WEB-DL")]
    WebDl,
    #[serde(rename = "HDRip")]
    HdRip,
    #[serde(rename = "DVDRip")]
    DvdRip,
}

impl Source {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "bluray" => Some(Self::BluRay),
            "web-dl" => Some(Self::WebDl),
            "hdrip" => Some(Self::HdRip),
            "dvdrip" => Some(Self::DvdRip),
            _ => None,
        }
    }
}

/// One playable/downloadable link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub quality: Quality,
    pub size: Option<String>,
    pub source: Option<Source>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub number: u32,
    pub streams: Vec<Stream>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Season {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub episodes: BTreeMap<u32, Episode>,
}

/// Seasons in discovery order, serialized as `{"season_1": {...}, ...}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Seasons(pub Vec<Season>);

impl Seasons {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&Season> {
        self.0.iter().find(|s| s.index == index)
    }
}

impl Serialize for Seasons {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for season in &self.0 {
            map.serialize_entry(&format!("season_{}", season.index), season)?;
        }
        map.end()
    }
}

/// Per-season archive links, serialized as `{"season_1": [...], ...}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonZips(pub BTreeMap<u32, Vec<Stream>>);

impl Serialize for SeasonZips {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (season, streams) in &self.0 {
            map.serialize_entry(&format!("season_{}", season), streams)?;
        }
        map.end()
    }
}

/// Raw record as returned by the upstream API
///
/// Every field is optional; keys not listed here (notably `season_N`)
/// are kept in `extra`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaRecord {
    #[serde(rename = "_id", default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub record_id: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub url_slug: Option<Value>,
    #[serde(default)]
    pub featured_image: Option<Value>,
    #[serde(default)]
    pub poster: Option<Value>,
    #[serde(default)]
    pub categories: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub modified_date: Option<Value>,
    #[serde(default)]
    pub links: Option<String>,
    #[serde(default)]
    pub season_zip: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Type-specific part of a normalized document
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaBody {
    Movie {
        streams: Vec<Stream>,
    },
    Series {
        seasons: Seasons,
        zip: SeasonZips,
    },
}

/// Final response document
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedMedia {
    #[serde(rename = "_id")]
    pub id: Option<Value>,
    pub record_id: Option<Value>,
    pub title: Option<Value>,
    pub url_slug: Option<Value>,
    pub featured_image: Option<Value>,
    pub poster: Option<Value>,
    pub categories: Option<Value>,
    pub status: Option<Value>,
    #[serde(flatten)]
    pub body: MediaBody,
    pub created_at: Option<Value>,
    pub updated_at: Option<Value>,
    pub generated_at: DateTime<Utc>,
}
