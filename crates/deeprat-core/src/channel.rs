//! Logical output channels.
//!
//! A [`Channel`] is the semantic identity a host asks for (`Red`, `Z`,
//! `DeepFront`, ...), independent of where the value is stored in a source.
//! Several channels may resolve to the same stored component.
//!
//! A [`ChannelSet`] is the ordered, duplicate-free list of channels a decode
//! call produces. Output records follow its order.
//!
//! # Naming
//!
//! Every channel has a canonical name (`rgba.red`, `depth.Z`, `deep.front`,
//! ...). Parsing is lenient and also accepts the short forms used on
//! command lines (`r`, `alpha`, `z`, `front`):
//!
//! ```rust
//! use deeprat_core::{Channel, ChannelSet};
//!
//! assert_eq!("r".parse::<Channel>().unwrap(), Channel::Red);
//! assert_eq!(Channel::named("rgba.alpha"), Channel::Alpha);
//! assert_eq!(Channel::named("Of.red"), Channel::Named("Of.red".into()));
//!
//! let set: ChannelSet = "r,g,b,a,z".parse().unwrap();
//! assert_eq!(set.len(), 5);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A logical channel requested by a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Channel {
    /// Red color component.
    Red,
    /// Green color component.
    Green,
    /// Blue color component.
    Blue,
    /// Coverage / opacity.
    Alpha,
    /// Inverse depth (`1 / front` for deep sources).
    Z,
    /// Front depth of a deep sample.
    DeepFront,
    /// Back depth of a deep sample.
    DeepBack,
    /// Any other channel, identified by exact name.
    Named(String),
}

impl Channel {
    /// Looks up a channel by its exact canonical name, creating a
    /// [`Channel::Named`] entry for anything else.
    pub fn named(name: &str) -> Self {
        match name {
            "rgba.red" => Self::Red,
            "rgba.green" => Self::Green,
            "rgba.blue" => Self::Blue,
            "rgba.alpha" => Self::Alpha,
            "depth.Z" => Self::Z,
            "deep.front" => Self::DeepFront,
            "deep.back" => Self::DeepBack,
            other => Self::Named(other.to_string()),
        }
    }

    /// Canonical channel name.
    pub fn name(&self) -> &str {
        match self {
            Self::Red => "rgba.red",
            Self::Green => "rgba.green",
            Self::Blue => "rgba.blue",
            Self::Alpha => "rgba.alpha",
            Self::Z => "depth.Z",
            Self::DeepFront => "deep.front",
            Self::DeepBack => "deep.back",
            Self::Named(name) => name,
        }
    }

    /// `true` for the three color channels.
    #[inline]
    pub fn is_rgb(&self) -> bool {
        matches!(self, Self::Red | Self::Green | Self::Blue)
    }

    /// `true` for the color channels and alpha.
    #[inline]
    pub fn is_rgba(&self) -> bool {
        self.is_rgb() || matches!(self, Self::Alpha)
    }

    /// `true` for channels a deep decoder computes from the depth plane.
    #[inline]
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Z | Self::DeepFront | Self::DeepBack)
    }

    /// Index of this channel within an RGB triple, if it is a color channel.
    #[inline]
    pub fn rgb_index(&self) -> Option<usize> {
        match self {
            Self::Red => Some(0),
            Self::Green => Some(1),
            Self::Blue => Some(2),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lenient parse: accepts canonical names plus short forms.
impl FromStr for Channel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s {
            "r" | "R" | "red" => Self::Red,
            "g" | "G" | "green" => Self::Green,
            "b" | "B" | "blue" => Self::Blue,
            "a" | "A" | "alpha" => Self::Alpha,
            "z" | "Z" | "depth" => Self::Z,
            "front" | "DeepFront" => Self::DeepFront,
            "back" | "DeepBack" => Self::DeepBack,
            other => Self::named(other),
        })
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.name().to_string()
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Self::named(&name)
    }
}

/// Ordered, duplicate-free list of channels.
///
/// Insertion order is preserved; inserting a channel that is already present
/// is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelSet {
    channels: SmallVec<[Channel; 8]>,
}

impl ChannelSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard RGBA set.
    pub fn rgba() -> Self {
        [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha]
            .into_iter()
            .collect()
    }

    /// Appends `channel` unless already present. Returns `true` if inserted.
    pub fn insert(&mut self, channel: Channel) -> bool {
        if self.contains(&channel) {
            return false;
        }
        self.channels.push(channel);
        true
    }

    /// Returns `true` if `channel` is in the set.
    #[inline]
    pub fn contains(&self, channel: &Channel) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    /// Position of `channel` within the set.
    #[inline]
    pub fn index_of(&self, channel: &Channel) -> Option<usize> {
        self.channels.iter().position(|c| c == channel)
    }

    /// Number of channels.
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if the set has no channels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Iterates channels in insertion order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Channel> {
        self.channels.iter()
    }

    /// Channels as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Channel] {
        &self.channels
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        let mut set = Self::new();
        for channel in iter {
            set.insert(channel);
        }
        set
    }
}

impl Extend<Channel> for ChannelSet {
    fn extend<I: IntoIterator<Item = Channel>>(&mut self, iter: I) {
        for channel in iter {
            self.insert(channel);
        }
    }
}

impl<'a> IntoIterator for &'a ChannelSet {
    type Item = &'a Channel;
    type IntoIter = std::slice::Iter<'a, Channel>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Parses a comma separated channel list.
impl FromStr for ChannelSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| Channel::from_str(part).unwrap_or_else(|never| match never {}))
            .collect())
    }
}

impl fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, channel) in self.channels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", channel)?;
        }
        Ok(())
    }
}
