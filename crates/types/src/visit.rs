use std::fmt;

/// Error returned when a visit identifier does not match the required shape.
#[derive(Debug, thiserror::Error)]
#[error("visit number must be 'D-' followed by eight digits, got {0:?}")]
pub struct VisitNoError(pub String);

/// A validated visit identifier: `D-` followed by an eight-digit zero-padded
/// sequence number (`D-00000042`).
///
/// Identifiers are allocated per branch by taking the highest existing one
/// and incrementing its sequence; see [`VisitNo::next_after`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisitNo(String);

impl VisitNo {
    /// The identifier allocated when a branch has no prior visits.
    pub fn first() -> Self {
        Self("D-00000001".to_owned())
    }

    /// Validates and wraps an existing identifier.
    pub fn parse(input: &str) -> Result<Self, VisitNoError> {
        let digits = input
            .strip_prefix("D-")
            .ok_or_else(|| VisitNoError(input.to_owned()))?;
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VisitNoError(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric sequence portion of the identifier.
    pub fn sequence(&self) -> u32 {
        self.0[2..].parse().expect("validated at construction")
    }

    /// The identifier following this one in the sequence.
    pub fn succ(&self) -> Self {
        Self(format!("D-{:08}", self.sequence() + 1))
    }

    /// Allocates the identifier after the highest existing one.
    ///
    /// Falls back to [`VisitNo::first`] when there is no prior identifier or
    /// the prior identifier does not match the expected shape.
    pub fn next_after(last: Option<&str>) -> Self {
        match last.map(Self::parse) {
            Some(Ok(prev)) => prev.succ(),
            _ => Self::first(),
        }
    }
}

impl fmt::Display for VisitNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VisitNo {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for VisitNo {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for VisitNo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        VisitNo::parse(&s).map_err(serde::de::Error::custom)
    }
}
