use std::fmt;

/// Error returned when a branch code cannot be recognised.
#[derive(Debug, thiserror::Error)]
#[error("unknown branch {0:?}")]
pub struct BranchError(pub String);

/// One of the three physical clinic locations.
///
/// Branches are addressed in two ways on the wire: the full location name
/// (`"Borivali"`, used by booking and closed-day administration) and a
/// three-letter short code (`"Bor"`, used by upload metadata and follow-up
/// records). [`Branch::parse`] accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Bhayander,
    Borivali,
    Malad,
}

impl Branch {
    /// All branches, in the order used for cross-branch sweeps.
    pub const ALL: [Branch; 3] = [Branch::Bhayander, Branch::Borivali, Branch::Malad];

    /// The full location name.
    pub fn name(self) -> &'static str {
        match self {
            Branch::Bhayander => "Bhayander",
            Branch::Borivali => "Borivali",
            Branch::Malad => "Malad",
        }
    }

    /// The three-letter short code used in upload metadata and follow-ups.
    pub fn short_code(self) -> &'static str {
        match self {
            Branch::Bhayander => "Bhy",
            Branch::Borivali => "Bor",
            Branch::Malad => "Mal",
        }
    }

    /// Parses a full name or short code.
    pub fn parse(input: &str) -> Result<Self, BranchError> {
        let trimmed = input.trim();
        Branch::ALL
            .into_iter()
            .find(|b| b.name() == trimmed || b.short_code() == trimmed)
            .ok_or_else(|| BranchError(input.to_owned()))
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl serde::Serialize for Branch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for Branch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Branch::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// The set of branches a closed-day entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchScope {
    /// Every branch is closed.
    All,
    /// Only the named branch is closed.
    Only(Branch),
}

impl BranchScope {
    /// Whether `branch` falls under this scope.
    pub fn covers(self, branch: Branch) -> bool {
        match self {
            BranchScope::All => true,
            BranchScope::Only(b) => b == branch,
        }
    }

    /// Parses `"All"` or any branch name/short code.
    pub fn parse(input: &str) -> Result<Self, BranchError> {
        if input.trim() == "All" {
            return Ok(BranchScope::All);
        }
        Branch::parse(input).map(BranchScope::Only)
    }
}

impl fmt::Display for BranchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchScope::All => f.write_str("All"),
            BranchScope::Only(b) => f.write_str(b.name()),
        }
    }
}

impl serde::Serialize for BranchScope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for BranchScope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BranchScope::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_full_names_and_short_codes() {
        assert_eq!(Branch::parse("Borivali").unwrap(), Branch::Borivali);
        assert_eq!(Branch::parse("Bor").unwrap(), Branch::Borivali);
        assert_eq!(Branch::parse("Bhy").unwrap(), Branch::Bhayander);
        assert_eq!(Branch::parse(" Malad ").unwrap(), Branch::Malad);
    }

    #[test]
    fn test_parse_rejects_unknown_codes() {
        assert!(Branch::parse("Andheri").is_err());
        assert!(Branch::parse("").is_err());
        // Case matters, matching how branch codes appear on the wire.
        assert!(Branch::parse("borivali").is_err());
    }

    #[test]
    fn test_scope_covers() {
        assert!(BranchScope::All.covers(Branch::Malad));
        assert!(BranchScope::Only(Branch::Malad).covers(Branch::Malad));
        assert!(!BranchScope::Only(Branch::Malad).covers(Branch::Borivali));
    }

    #[test]
    fn test_scope_serde_round_trip() {
        let all: BranchScope = serde_json::from_str("\"All\"").unwrap();
        assert_eq!(all, BranchScope::All);

        let only: BranchScope = serde_json::from_str("\"Bhayander\"").unwrap();
        assert_eq!(only, BranchScope::Only(Branch::Bhayander));
        assert_eq!(serde_json::to_string(&only).unwrap(), "\"Bhayander\"");
    }
}
