use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

pub const DEFAULT_QUALITY: Quality = Quality::VideoHigh;
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A closed set of variants stored by a stable name.
pub trait Symbolic: Sized + Copy + 'static {
    const KIND: &'static str;
    const VARIANTS: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Names are matched case-insensitively, the way records have always been read.
    fn from_symbol(value: &str) -> Result<Self, DecodeError> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| DecodeError::UnknownVariant {
                kind: Self::KIND,
                value: value.to_string(),
            })
    }
}

macro_rules! symbolic_enum {
    ($name:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl Symbolic for $name {
            const KIND: &'static str = $kind;
            const VARIANTS: &'static [Self] = &[$($name::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_symbol(s)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Unknown,
    YouTube,
    Vimeo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    Unknown,
    Video,
    Playlist,
    Channel,
    User,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    VideoHigh,
    VideoLow,
    AudioHigh,
    AudioLow,
}

symbolic_enum!(Provider, "provider", [Unknown, YouTube, Vimeo]);
symbolic_enum!(LinkType, "link type", [Unknown, Video, Playlist, Channel, User, Group]);
symbolic_enum!(Quality, "quality", [VideoHigh, VideoLow, AudioHigh, AudioLow]);

impl Default for Quality {
    fn default() -> Self {
        DEFAULT_QUALITY
    }
}

/// The feed configuration a short key stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMetadata {
    pub provider: Provider,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub id: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl FeedMetadata {
    pub fn new(provider: Provider, link_type: LinkType, id: impl Into<String>) -> Self {
        Self {
            provider,
            link_type,
            id: id.into(),
            quality: DEFAULT_QUALITY,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}
