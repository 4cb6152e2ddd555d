use std::collections::{HashMap, HashSet};

/// Default staleness threshold in days
pub const DEFAULT_STALE_DAYS: u32 = 90;

/// Default image size threshold in megabytes
pub const DEFAULT_MAX_SIZE_MB: u64 = 1024;

/// Default minimum monthly cost, in USD, for a finding to be reported
pub const DEFAULT_MIN_MONTHLY_COST: f64 = 0.10;

/// Parameters fixed for the duration of one scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Days since last activity before an image counts as stale.
    /// Zero disables the staleness rule
    pub stale_days: u32,

    /// Size in bytes above which an image is flagged.
    /// Zero disables the size rule
    pub max_size_bytes: u64,

    /// Findings wasting less than this many USD per month are dropped
    /// by the analyzer
    pub min_monthly_cost: f64,

    /// Resources to skip
    pub exclude: ExcludeSet,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            stale_days: DEFAULT_STALE_DAYS,
            max_size_bytes: DEFAULT_MAX_SIZE_MB * 1024 * 1024,
            min_monthly_cost: DEFAULT_MIN_MONTHLY_COST,
            exclude: ExcludeSet::default(),
        }
    }
}

/// Resource exclusion rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    /// Repository identifiers skipped entirely, image findings included
    pub resource_ids: HashSet<String>,

    /// Tag key/value pairs to skip. Carried for providers that expose
    /// repository tags; no current provider does, so these filter nothing
    pub tags: HashMap<String, String>,
}

impl ExcludeSet {
    /// True when the repository identifier is excluded
    #[must_use]
    pub fn contains_resource(&self, id: &str) -> bool {
        self.resource_ids.contains(id)
    }
}
