use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier exactly as the API issued it.
///
/// The backend is free to use numeric keys or opaque strings; we keep whichever
/// shape arrived so the value round-trips unchanged on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{n}"),
            RawId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for RawId {
    type Err = std::convert::Infallible;

    /// Canonical digits parse as a number; anything else, leading zeros
    /// included, is kept as text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(trimmed
            .parse::<u64>()
            .ok()
            .filter(|n| n.to_string() == trimmed)
            .map_or_else(|| RawId::Text(trimmed.to_owned()), RawId::Number))
    }
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(RawId);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(RawId::Number(id))
            }

            #[must_use]
            pub fn text(id: impl Into<String>) -> Self {
                Self(RawId::Text(id.into()))
            }

            #[must_use]
            pub fn raw(&self) -> &RawId {
                &self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self::new(id)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

opaque_id!(
    /// Identifier of an assessment.
    AssessmentId
);
opaque_id!(
    /// Identifier of a question, unique within its assessment.
    QuestionId
);
opaque_id!(
    /// Identifier of an answer option, unique within its question.
    OptionId
);
opaque_id!(
    /// Identifier of the course an assessment belongs to.
    CourseId
);
