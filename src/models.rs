use serde::{Deserialize, Serialize};

/// One row of physical index statistics for a (table, index) pair, as
/// returned by `sys.dm_db_index_physical_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentationRecord {
    pub table_name: String,
    /// The literal "NULL" for heaps, which carry no index name.
    pub index_name: String,
    /// DMV `type_desc`: "HEAP", "CLUSTERED", "NONCLUSTERED", ...
    pub index_type: String,
    pub fragmentation_percent: f64,
    pub page_count: i64,
}

impl FragmentationRecord {
    pub fn is_heap(&self) -> bool {
        self.index_type == "HEAP"
    }
}

/// Maintenance action recommended for a single index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Heap table fragmented enough to warrant a clustered index
    BuildClusteredIndex,
    /// Too small for maintenance to pay off
    NoAction,
    /// Fragmentation above 30%
    Rebuild,
    /// Fragmentation between 5% and 30%
    Reorganize,
    /// Nothing to do
    Healthy,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::BuildClusteredIndex => "BUILD CLUSTERED INDEX",
            Recommendation::NoAction => "NO ACTION",
            Recommendation::Rebuild => "REBUILD",
            Recommendation::Reorganize => "REORGANIZE",
            Recommendation::Healthy => "HEALTHY",
        }
    }
}

/// Display emphasis for a record, derived from fragmentation alone. Cosmetic:
/// it never feeds back into the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// The three maintenance buckets. Membership is independent: a record can
/// land in zero, one, or two buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceSummary {
    /// Fragmentation > 30% with more than 1000 pages
    pub needs_rebuild: Vec<FragmentationRecord>,
    /// Fragmentation 5-30% with more than 1000 pages
    pub needs_reorganize: Vec<FragmentationRecord>,
    /// Heaps above 30% fragmentation, regardless of page count
    pub heap_tables: Vec<FragmentationRecord>,
}

impl MaintenanceSummary {
    pub fn is_empty(&self) -> bool {
        self.needs_rebuild.is_empty()
            && self.needs_reorganize.is_empty()
            && self.heap_tables.is_empty()
    }
}

/// Overall analysis results
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// All records, in the order the database returned them (the query sorts
    /// by descending fragmentation)
    pub records: Vec<FragmentationRecord>,
    /// Bucketed maintenance summary
    pub summary: MaintenanceSummary,
}
