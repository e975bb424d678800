use crate::models::{FragmentationRecord, MaintenanceSummary, Recommendation, Severity};

/// Fragmentation above this calls for ALTER INDEX ... REBUILD.
pub const REBUILD_FRAGMENTATION_THRESHOLD: f64 = 30.0;
/// Fragmentation at or above this, up to the rebuild threshold, calls for REORGANIZE.
pub const REORGANIZE_FRAGMENTATION_THRESHOLD: f64 = 5.0;
/// Indexes below this page count are too small for maintenance to matter.
pub const SMALL_INDEX_PAGE_COUNT: i64 = 1000;

/// Maps a record to its maintenance recommendation. First match wins.
///
/// The heap check runs before the small-index exemption: a heavily
/// fragmented heap is flagged even under 1000 pages.
pub fn classify(record: &FragmentationRecord) -> Recommendation {
    if record.is_heap() && record.fragmentation_percent > REBUILD_FRAGMENTATION_THRESHOLD {
        return Recommendation::BuildClusteredIndex;
    }

    if record.page_count < SMALL_INDEX_PAGE_COUNT {
        return Recommendation::NoAction;
    }

    if record.fragmentation_percent > REBUILD_FRAGMENTATION_THRESHOLD {
        return Recommendation::Rebuild;
    }

    if record.fragmentation_percent >= REORGANIZE_FRAGMENTATION_THRESHOLD {
        return Recommendation::Reorganize;
    }

    Recommendation::Healthy
}

/// Display emphasis from fragmentation alone, independent of the recommendation.
pub fn severity(fragmentation_percent: f64) -> Severity {
    if fragmentation_percent > REBUILD_FRAGMENTATION_THRESHOLD {
        Severity::High
    } else if fragmentation_percent >= REORGANIZE_FRAGMENTATION_THRESHOLD {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Partitions records into the three summary buckets.
///
/// The rebuild and reorganize buckets gate on more than 1000 pages; the heap
/// bucket has no page-count gate, mirroring the classifier's heap rule.
pub fn summarize(records: &[FragmentationRecord]) -> MaintenanceSummary {
    MaintenanceSummary {
        needs_rebuild: records
            .iter()
            .filter(|r| {
                r.fragmentation_percent > REBUILD_FRAGMENTATION_THRESHOLD
                    && r.page_count > SMALL_INDEX_PAGE_COUNT
            })
            .cloned()
            .collect(),
        needs_reorganize: records
            .iter()
            .filter(|r| {
                r.fragmentation_percent >= REORGANIZE_FRAGMENTATION_THRESHOLD
                    && r.fragmentation_percent <= REBUILD_FRAGMENTATION_THRESHOLD
                    && r.page_count > SMALL_INDEX_PAGE_COUNT
            })
            .cloned()
            .collect(),
        heap_tables: records
            .iter()
            .filter(|r| r.is_heap() && r.fragmentation_percent > REBUILD_FRAGMENTATION_THRESHOLD)
            .cloned()
            .collect(),
    }
}

pub fn create_clustered_index_command(record: &FragmentationRecord) -> String {
    format!(
        "CREATE CLUSTERED INDEX CIX_{table} ON {table}(<key column>);",
        table = record.table_name
    )
}

pub fn rebuild_command(record: &FragmentationRecord) -> String {
    format!(
        "ALTER INDEX {} ON {} REBUILD;",
        record.index_name, record.table_name
    )
}

pub fn reorganize_command(record: &FragmentationRecord) -> String {
    format!(
        "ALTER INDEX {} ON {} REORGANIZE;",
        record.index_name, record.table_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(
        table: &str,
        index: &str,
        index_type: &str,
        frag: f64,
        pages: i64,
    ) -> FragmentationRecord {
        FragmentationRecord {
            table_name: table.into(),
            index_name: index.into(),
            index_type: index_type.into(),
            fragmentation_percent: frag,
            page_count: pages,
        }
    }

    #[rstest]
    #[case("HEAP", 45.0, 500, Recommendation::BuildClusteredIndex)]
    #[case("HEAP", 31.0, 50_000, Recommendation::BuildClusteredIndex)]
    #[case("HEAP", 30.0, 500, Recommendation::NoAction)]
    #[case("HEAP", 25.0, 5_000, Recommendation::Reorganize)]
    #[case("NONCLUSTERED", 60.0, 50, Recommendation::NoAction)]
    #[case("NONCLUSTERED", 60.0, 999, Recommendation::NoAction)]
    #[case("NONCLUSTERED", 35.0, 1_000, Recommendation::Rebuild)]
    #[case("NONCLUSTERED", 35.0, 2_000, Recommendation::Rebuild)]
    #[case("NONCLUSTERED", 30.0, 2_000, Recommendation::Reorganize)]
    #[case("NONCLUSTERED", 10.0, 1_500, Recommendation::Reorganize)]
    #[case("CLUSTERED", 5.0, 1_500, Recommendation::Reorganize)]
    #[case("CLUSTERED", 4.99, 1_500, Recommendation::Healthy)]
    #[case("CLUSTERED", 0.0, 100_000, Recommendation::Healthy)]
    fn test_classify(
        #[case] index_type: &str,
        #[case] frag: f64,
        #[case] pages: i64,
        #[case] expected: Recommendation,
    ) {
        let record = record("T", "IX_T", index_type, frag, pages);
        assert_eq!(classify(&record), expected);
    }

    #[rstest]
    #[case(45.0, Severity::High)]
    #[case(30.01, Severity::High)]
    #[case(30.0, Severity::Medium)]
    #[case(5.0, Severity::Medium)]
    #[case(4.99, Severity::Low)]
    #[case(0.0, Severity::Low)]
    fn test_severity(#[case] frag: f64, #[case] expected: Severity) {
        assert_eq!(severity(frag), expected);
    }

    #[test]
    fn small_fragmented_heap_is_flagged_but_only_in_the_heap_bucket() {
        let orders = record("Orders", "NULL", "HEAP", 45.0, 500);
        assert_eq!(classify(&orders), Recommendation::BuildClusteredIndex);

        let summary = summarize(std::slice::from_ref(&orders));
        assert_eq!(summary.heap_tables, vec![orders]);
        assert!(summary.needs_rebuild.is_empty());
        assert!(summary.needs_reorganize.is_empty());
    }

    #[test]
    fn large_fragmented_heap_lands_in_two_buckets() {
        let heap = record("Events", "NULL", "HEAP", 45.0, 5_000);

        let summary = summarize(std::slice::from_ref(&heap));
        assert_eq!(summary.heap_tables.len(), 1);
        assert_eq!(summary.needs_rebuild.len(), 1);
        assert!(summary.needs_reorganize.is_empty());
    }

    #[test]
    fn fragmented_nonclustered_index_needs_rebuild() {
        let customers = record("Customers", "IX_Name", "NONCLUSTERED", 35.0, 2_000);
        assert_eq!(classify(&customers), Recommendation::Rebuild);

        let summary = summarize(std::slice::from_ref(&customers));
        assert_eq!(summary.needs_rebuild, vec![customers]);
        assert!(summary.heap_tables.is_empty());
    }

    #[test]
    fn moderately_fragmented_index_needs_reorganize() {
        let logs = record("Logs", "IX_Date", "NONCLUSTERED", 10.0, 1_500);
        assert_eq!(classify(&logs), Recommendation::Reorganize);

        let summary = summarize(std::slice::from_ref(&logs));
        assert_eq!(summary.needs_reorganize, vec![logs]);
    }

    #[test]
    fn small_index_lands_in_no_bucket() {
        let small = record("Small", "IX_X", "NONCLUSTERED", 60.0, 50);
        assert_eq!(classify(&small), Recommendation::NoAction);

        assert!(summarize(std::slice::from_ref(&small)).is_empty());
    }

    #[test]
    fn thousand_page_index_is_classified_but_not_bucketed() {
        // The classifier exempts pages < 1000; the buckets require pages > 1000.
        let boundary = record("Edge", "IX_E", "NONCLUSTERED", 40.0, 1_000);
        assert_eq!(classify(&boundary), Recommendation::Rebuild);
        assert!(summarize(std::slice::from_ref(&boundary)).is_empty());
    }

    #[test]
    fn empty_record_set_produces_empty_summary() {
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn remediation_commands_substitute_names() {
        let heap = record("Orders", "NULL", "HEAP", 45.0, 500);
        assert_eq!(
            create_clustered_index_command(&heap),
            "CREATE CLUSTERED INDEX CIX_Orders ON Orders(<key column>);"
        );

        let ix = record("Customers", "IX_Name", "NONCLUSTERED", 35.0, 2_000);
        assert_eq!(
            rebuild_command(&ix),
            "ALTER INDEX IX_Name ON Customers REBUILD;"
        );
        assert_eq!(
            reorganize_command(&ix),
            "ALTER INDEX IX_Name ON Customers REORGANIZE;"
        );
    }
}
