/// Identifier for a stored document
///
/// A globally unique identifier (ULID) assigned by the store on insertion.
/// ULIDs are lexicographically sortable by creation time, which gives
/// `read_all` a stable oldest-first ordering without a separate index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    id: ulid::Ulid,
}

impl RecordId {
    /// Create a record ID from an existing ULID
    #[must_use]
    pub const fn new(id: ulid::Ulid) -> Self {
        Self { id }
    }

    /// Generate a new unique record ID
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }

    /// Parse a record ID from a file stem like `01ARYZ6S41ABCDEF01234567AB`
    ///
    /// Validates that the stem is a bare ULID, which rejects path
    /// separators and traversal patterns before they reach the filesystem.
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        if stem.contains('/') || stem.contains('\\') || stem.contains("..") {
            return None;
        }

        ulid::Ulid::from_string(stem).ok().map(|id| Self { id })
    }

    /// Get the timestamp (milliseconds since Unix epoch) encoded in this ID
    #[must_use]
    pub const fn timestamp_ms(&self) -> u64 {
        self.id.timestamp_ms()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl std::str::FromStr for RecordId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(|id| Self { id })
    }
}

impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&s).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_validation() {
        assert!(RecordId::from_file_stem("01ARZ3NDEKTSV4RRFFQ69G5FAV").is_some());

        // Security: traversal patterns are rejected outright
        assert!(RecordId::from_file_stem("../etc/passwd").is_none());
        assert!(RecordId::from_file_stem("foo/bar").is_none());
        assert!(RecordId::from_file_stem("..\\windows").is_none());

        // Format
        assert!(RecordId::from_file_stem("not_a_valid_ulid").is_none());
        assert!(RecordId::from_file_stem("1234567890").is_none());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let id = RecordId::generate();
        let parsed: RecordId = id.to_string().parse().expect("valid ULID");
        assert_eq!(id, parsed);
    }
}
