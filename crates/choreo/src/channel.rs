//! Typed animation channel paths.
//!
//! Only four kinds of channel can be animated. Anything else is rejected
//! when the scene is loaded.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "0" | "x" | "X" => Some(Axis::X),
            "1" | "y" | "Y" => Some(Axis::Y),
            "2" | "z" | "Z" => Some(Axis::Z),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelPath {
    Location(Axis),
    /// Euler rotation, radians
    Rotation(Axis),
    /// Named scalar property, e.g. a material input
    Property(String),
    /// Shape key value by key name
    ShapeKey(String),
}

impl ChannelPath {
    pub fn location(index: usize) -> Option<Self> {
        Axis::ALL.get(index).map(|a| ChannelPath::Location(*a))
    }

    pub fn rotation(index: usize) -> Option<Self> {
        Axis::ALL.get(index).map(|a| ChannelPath::Rotation(*a))
    }
}

/// `"name"` -> `name`
fn quoted(s: &str) -> Option<&str> {
    let inner = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))?;
    (!inner.is_empty()).then_some(inner)
}

/// `[...]` -> `...`, or `.x` -> `x`
fn index_suffix(s: &str) -> Option<&str> {
    s.strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .or_else(|| s.strip_prefix('.'))
}

impl FromStr for ChannelPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim();
        let unknown = || Error::UnknownChannel(s.to_string());

        if let Some(rest) = path.strip_prefix("location") {
            return index_suffix(rest)
                .and_then(Axis::parse)
                .map(ChannelPath::Location)
                .ok_or_else(unknown);
        }
        if let Some(rest) = path
            .strip_prefix("rotation_euler")
            .or_else(|| path.strip_prefix("rotation"))
        {
            return index_suffix(rest)
                .and_then(Axis::parse)
                .map(ChannelPath::Rotation)
                .ok_or_else(unknown);
        }
        if let Some(rest) = path.strip_prefix("key_blocks[") {
            return rest
                .strip_suffix("].value")
                .and_then(quoted)
                .map(|name| ChannelPath::ShapeKey(name.to_string()))
                .ok_or_else(unknown);
        }
        if let Some(rest) = path.strip_prefix('[') {
            return rest
                .strip_suffix(']')
                .and_then(quoted)
                .map(|name| ChannelPath::Property(name.to_string()))
                .ok_or_else(unknown);
        }
        Err(unknown())
    }
}

impl TryFrom<String> for ChannelPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChannelPath> for String {
    fn from(path: ChannelPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for ChannelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelPath::Location(axis) => write!(f, "location[{}]", axis.index()),
            ChannelPath::Rotation(axis) => write!(f, "rotation_euler[{}]", axis.index()),
            ChannelPath::Property(name) => write!(f, "[\"{name}\"]"),
            ChannelPath::ShapeKey(name) => write!(f, "key_blocks[\"{name}\"].value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(s: &str) -> ChannelPath {
        s.parse().unwrap()
    }

    #[test]
    fn accepted_spellings() {
        assert_eq!(parse("location[2]"), ChannelPath::Location(Axis::Z));
        assert_eq!(parse("location.y"), ChannelPath::Location(Axis::Y));
        assert_eq!(parse("rotation_euler[0]"), ChannelPath::Rotation(Axis::X));
        assert_eq!(parse("rotation.z"), ChannelPath::Rotation(Axis::Z));
        assert_eq!(parse("[\"emission\"]"), ChannelPath::Property("emission".into()));
        assert_eq!(
            parse("key_blocks['open'].value"),
            ChannelPath::ShapeKey("open".into())
        );
    }

    #[test]
    fn rejects_everything_else() {
        for bad in [
            "location[3]",
            "scale[0]",
            "rotation_quaternion[0]",
            "key_blocks[\"open\"]",
            "[\"\"]",
            "__import__('os')",
            "",
        ] {
            assert!(
                matches!(bad.parse::<ChannelPath>(), Err(Error::UnknownChannel(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        for path in [
            ChannelPath::Location(Axis::X),
            ChannelPath::Rotation(Axis::Y),
            ChannelPath::Property("roughness".into()),
            ChannelPath::ShapeKey("Key 1".into()),
        ] {
            assert_eq!(parse(&path.to_string()), path);
        }
    }
}
