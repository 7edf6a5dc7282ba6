//! Partition key strings: normalization, coverage, hierarchy navigation.
//!
//! A partition key is an ordered sequence of `segment=value` tokens joined
//! by `/`. Keys are stored normalized (no trailing separator) so equality is
//! plain string equality.

use std::fmt;

/// Top-level tenant segment name. Partition trees are always scoped under
/// a tenant; paths without this segment are ignored by the sync engine.
pub const TENANT_LEVEL: &str = "idEmpresa";

/// Year segment name.
pub const YEAR_LEVEL: &str = "Ano";

/// Month segment name.
pub const MONTH_LEVEL: &str = "Mes";

/// Day segment name. Optional per dataset.
pub const DAY_LEVEL: &str = "Dia";

/// Combined date segment name, used by datasets that encode the full date
/// in a single token directly under the tenant.
pub const COMBINED_DATE_LEVEL: &str = "AnoMesDia";

/// Segment names that mark a dataset as date-partitioned.
pub const DATE_LEVELS: &[&str] = &[YEAR_LEVEL, MONTH_LEVEL, DAY_LEVEL, COMBINED_DATE_LEVEL];

/// A normalized hierarchical partition key.
///
/// Ordering is lexicographic over the normalized string, which places a
/// parent immediately before the keys it covers; [`ExclusionPlan`] relies
/// on that to deduplicate covering prefixes in a single pass.
///
/// [`ExclusionPlan`]: crate::planner::ExclusionPlan
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Creates a key from a path string, stripping trailing separators.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self(path.trim_end_matches('/').to_string())
    }

    /// Derives the partition key of an object by dropping the final path
    /// segment (the file name).
    ///
    /// Total on any well-formed UTF-8 path: a key with no directory part
    /// yields the empty key.
    #[must_use]
    pub fn from_object_key(object_key: &str) -> Self {
        let trimmed = object_key.trim_end_matches('/');
        trimmed
            .rfind('/')
            .map_or_else(|| Self(String::new()), |idx| Self::new(&trimmed[..idx]))
    }

    /// The normalized key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key has no segments at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `other` is this key or falls underneath it.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.0 == self.0
            || (other.0.len() > self.0.len()
                && other.0.starts_with(&self.0)
                && other.0.as_bytes()[self.0.len()] == b'/')
    }

    /// Iterates the `segment=value` tokens in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Name of the finest (last) segment, e.g. `Mes` for
    /// `idEmpresa=1/Ano=2024/Mes=03`.
    #[must_use]
    pub fn level(&self) -> Option<&str> {
        let last = self.segments().last()?;
        Some(last.split_once('=').map_or(last, |(name, _)| name))
    }

    /// The key with the finest segment removed, or `None` for a
    /// single-segment (or empty) key.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.rfind('/').map(|idx| Self::new(&self.0[..idx]))
    }

    /// Value of the named segment, if present.
    #[must_use]
    pub fn segment_value(&self, level: &str) -> Option<&str> {
        self.segments().find_map(|seg| {
            let (name, value) = seg.split_once('=')?;
            (name == level).then_some(value)
        })
    }

    /// The key truncated at the named segment (inclusive), if present.
    ///
    /// `idEmpresa=1/Ano=2024/Mes=03` truncated at `Ano` is
    /// `idEmpresa=1/Ano=2024`.
    #[must_use]
    pub fn ancestor_at(&self, level: &str) -> Option<Self> {
        let mut consumed = 0;
        for seg in self.0.split('/') {
            let end = consumed + seg.len();
            if !seg.is_empty() {
                let name = seg.split_once('=').map_or(seg, |(name, _)| name);
                if name == level {
                    return Some(Self::new(&self.0[..end]));
                }
            }
            consumed = end + 1;
        }
        None
    }

    /// The tenant prefix of this key, if it is tenant-scoped.
    #[must_use]
    pub fn tenant(&self) -> Option<Self> {
        self.ancestor_at(TENANT_LEVEL)
    }

    /// Whether the key contains the tenant segment.
    #[must_use]
    pub fn is_tenant_scoped(&self) -> bool {
        self.segment_value(TENANT_LEVEL).is_some()
    }

    /// Whether the key contains any date segment.
    #[must_use]
    pub fn has_date_level(&self) -> bool {
        DATE_LEVELS
            .iter()
            .any(|level| self.segment_value(level).is_some())
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
