//! Property tests over randomly generated event logs.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use trajectory_kernel::{
    adjacency, edge_list, sessions, shifted, step_matrix, EdgeListParams, EventLog, EventRecord,
    NormType, RoleConfig, SessionParams, StepMatrixParams,
};

const ENTITIES: &[&str] = &["u1", "u2", "u3", "u4"];
const EVENTS: &[&str] = &["main", "catalog", "cart", "purchase", "lost"];
const TOLERANCE: f64 = 1e-9;

fn arb_log() -> impl Strategy<Value = EventLog> {
    prop::collection::vec((0..ENTITIES.len(), 0..EVENTS.len(), 0i64..20_000), 1..60).prop_map(|rows| {
        rows.into_iter()
            .map(|(e, ev, secs)| {
                EventRecord::new(
                    ENTITIES[e],
                    EVENTS[ev],
                    Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap(),
                )
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn shift_pairs_each_row_with_its_successor(log in arb_log()) {
        let rows = shifted(&log, &RoleConfig::default()).unwrap();
        prop_assert_eq!(rows.len(), log.len());

        for pair in rows.windows(2) {
            let same_entity = pair[0].record.entity_id == pair[1].record.entity_id;
            if same_entity {
                prop_assert_eq!(pair[0].next_event, Some(pair[1].record.event.as_str()));
                prop_assert!(pair[0].record.timestamp <= pair[1].record.timestamp);
            } else {
                prop_assert_eq!(pair[0].next_event, None);
            }
        }
        prop_assert_eq!(rows.last().and_then(|r| r.next_event), None);
    }

    #[test]
    fn full_normalization_sums_to_one(log in arb_log()) {
        let params = EdgeListParams::new().with_norm(NormType::Full);
        let edges = edge_list(&log, &RoleConfig::default(), &params).unwrap();
        if !edges.is_empty() {
            prop_assert!((edges.total_weight() - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn node_normalization_sums_to_one_per_source(log in arb_log()) {
        let params = EdgeListParams::new().with_norm(NormType::Node);
        let edges = edge_list(&log, &RoleConfig::default(), &params).unwrap();

        let mut outgoing: BTreeMap<&str, f64> = BTreeMap::new();
        for edge in &edges {
            *outgoing.entry(edge.source.as_str()).or_insert(0.0) += edge.weight;
        }
        for (_, sum) in outgoing {
            prop_assert!((sum - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn adjacency_is_square_over_all_events(log in arb_log()) {
        let matrix = adjacency(&log, &RoleConfig::default(), None, None).unwrap();
        let events: Vec<String> = log.event_names().into_iter().map(str::to_string).collect();

        prop_assert_eq!(matrix.labels(), events.as_slice());
        prop_assert_eq!(matrix.values().len(), events.len());
        for row in matrix.values() {
            prop_assert_eq!(row.len(), events.len());
        }
    }

    #[test]
    fn step_matrix_columns_sum_to_one(log in arb_log(), sorting in any::<bool>()) {
        let config = RoleConfig::default().with_target_events(["purchase", "lost"]);
        let params = StepMatrixParams::default().with_sorting(sorting);
        let matrix = step_matrix(&log, &config, &params).unwrap();

        for sum in matrix.column_sums() {
            prop_assert!((sum - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn accumulated_row_is_non_decreasing(log in arb_log()) {
        let config = RoleConfig::default().with_target_events(["purchase"]);
        let params = StepMatrixParams::default().with_max_steps(0);
        let matrix = step_matrix(&log, &config, &params).unwrap();

        let row = matrix.row("Accumulated purchase").unwrap();
        for pair in row.windows(2) {
            prop_assert!(pair[1] >= pair[0] - TOLERANCE);
        }
    }

    #[test]
    fn session_ordinals_never_decrease(log in arb_log(), thresh in 0.0f64..5_000.0) {
        let out = sessions(&log, &RoleConfig::default(), &SessionParams::by_gap(thresh).with_eos_event("end")).unwrap();

        for pair in out.rows.windows(2) {
            if pair[0].record.entity_id == pair[1].record.entity_id {
                prop_assert!(pair[0].ordinal <= pair[1].ordinal);
            }
        }

        // End-of-session rows sit one second late and may pass the next real row.
        let real: Vec<_> = out.rows.iter().filter(|r| !r.synthetic).collect();
        for pair in real.windows(2) {
            if pair[0].record.entity_id == pair[1].record.entity_id {
                prop_assert!(pair[0].record.timestamp <= pair[1].record.timestamp);
            }
        }
    }

    #[test]
    fn marker_sessions_count_markers(log in arb_log()) {
        let out = sessions(&log, &RoleConfig::default(), &SessionParams::by_event("cart")).unwrap();

        let mut markers: BTreeMap<&str, u32> = BTreeMap::new();
        for row in &out.rows {
            let seen = markers.entry(row.record.entity_id.as_str()).or_insert(0);
            if row.record.event == "cart" {
                *seen += 1;
            }
            prop_assert_eq!(row.ordinal, *seen);
        }
    }
}
