//! Diffing the desired ranges against the managed part of the allow-list.
//!
//! Only entries whose name starts with the tag prefix are considered; all
//! other entries are invisible to the plan. Matching is by trimmed value,
//! greedy, in desired order: each desired range claims the first managed
//! entry holding the same value that no earlier range claimed. A managed
//! duplicate survives only while a further desired range shares its value;
//! the rest end up in `to_delete`.

use crate::types::{DesiredEntry, ManagedEntry, PlannedEntry, ReconciliationPlan, RemoteEntry};

/// Name given to the desired range at 0-based `index` in the full desired list.
pub fn entry_name(tag_prefix: &str, index: usize) -> String {
    format!("{}-{:03}", tag_prefix, index + 1)
}

/// Keeps the entries inside the managed namespace, values trimmed.
pub fn managed_entries(all_remote: &[RemoteEntry], tag_prefix: &str) -> Vec<ManagedEntry> {
    all_remote
        .iter()
        .filter(|e| e.name.as_deref().is_some_and(|n| n.starts_with(tag_prefix)))
        .cloned()
        .map(ManagedEntry::new)
        .collect()
}

/// Computes the deletions and creations needed for the managed namespace
/// to hold exactly `desired`.
///
/// The `matched` flags of `desired` are updated in place.
pub fn compute_plan(
    desired: &mut [DesiredEntry],
    all_remote: &[RemoteEntry],
    tag_prefix: &str,
) -> ReconciliationPlan {
    let mut managed = managed_entries(all_remote, tag_prefix);

    for wanted in desired.iter_mut() {
        if let Some(existing) = managed
            .iter_mut()
            .find(|m| !m.matched && m.entry.value == wanted.ip)
        {
            existing.matched = true;
            wanted.matched = true;
        }
    }

    let to_delete = managed.into_iter().filter(|m| !m.matched).collect();
    let to_create = desired
        .iter()
        .enumerate()
        .filter(|(_, d)| !d.matched)
        .map(|(i, d)| PlannedEntry {
            ip: d.ip.clone(),
            name: entry_name(tag_prefix, i),
            index: i + 1,
        })
        .collect();
    let unchanged = desired.iter().filter(|d| d.matched).count();

    ReconciliationPlan {
        to_delete,
        to_create,
        unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "fabric.eastus";

    fn remote(id: &str, name: Option<&str>, value: &str) -> RemoteEntry {
        RemoteEntry {
            id: id.into(),
            name: name.map(str::to_string),
            value: value.into(),
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn desired(ranges: &[&str]) -> Vec<DesiredEntry> {
        ranges.iter().map(|r| DesiredEntry::new(*r)).collect()
    }

    #[test]
    fn creates_only_the_missing_range() {
        let mut wanted = desired(&["10.0.0.0/24", "10.0.1.0/24"]);
        let existing = vec![remote("IPE_1", Some("fabric.eastus-001"), "10.0.0.0/24")];

        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        assert!(plan.to_delete.is_empty());
        assert_eq!(
            plan.to_create,
            vec![PlannedEntry {
                ip: "10.0.1.0/24".into(),
                name: "fabric.eastus-002".into(),
                index: 2,
            }]
        );
        assert_eq!(plan.unchanged, 1);
    }

    #[test]
    fn empty_desired_set_deletes_managed_entries() {
        let mut wanted = desired(&[]);
        let existing = vec![remote("IPE_1", Some("fabric.eastus-001"), "10.0.0.0/24")];

        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].entry.id, "IPE_1");
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.unchanged, 0);
    }

    #[test]
    fn unmanaged_entries_are_never_touched() {
        let mut wanted = desired(&["10.0.0.0/24"]);
        let existing = vec![
            remote("IPE_1", Some("office-vpn"), "10.0.0.0/24"),
            remote("IPE_2", None, "172.16.0.0/12"),
            remote("IPE_3", Some("Fabric.eastus-001"), "10.9.9.0/24"),
            remote("IPE_4", Some("fabric.westus-001"), "10.8.8.0/24"),
        ];

        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        assert!(plan.to_delete.is_empty());
        assert_eq!(plan.unchanged, 0);
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].name, "fabric.eastus-001");
    }

    #[test]
    fn remote_values_are_trimmed_before_comparison() {
        let mut wanted = desired(&["10.0.0.0/24"]);
        let existing = vec![remote("IPE_1", Some("fabric.eastus-001"), "  10.0.0.0/24\n")];

        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, 1);
        assert!(wanted[0].matched);
    }

    #[test]
    fn names_follow_the_full_desired_ordering() {
        let mut wanted = desired(&["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]);
        let existing = vec![
            remote("IPE_1", Some("fabric.eastus-001"), "10.0.0.0/24"),
            remote("IPE_3", Some("fabric.eastus-003"), "10.0.2.0/24"),
        ];

        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        let names: Vec<&str> = plan.to_create.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["fabric.eastus-002", "fabric.eastus-004"]);
    }

    #[test]
    fn names_are_zero_padded() {
        assert_eq!(entry_name(PREFIX, 0), "fabric.eastus-001");
        assert_eq!(entry_name(PREFIX, 41), "fabric.eastus-042");
        assert_eq!(entry_name(PREFIX, 998), "fabric.eastus-999");
    }

    #[test]
    fn stale_entries_are_deleted_in_listing_order() {
        let mut wanted = desired(&["10.0.1.0/24"]);
        let existing = vec![
            remote("IPE_9", Some("fabric.eastus-009"), "10.0.9.0/24"),
            remote("IPE_1", Some("fabric.eastus-001"), "10.0.1.0/24"),
            remote("IPE_5", Some("fabric.eastus-005"), "10.0.5.0/24"),
        ];

        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        let ids: Vec<&str> = plan.to_delete.iter().map(|m| m.entry.id.as_str()).collect();
        assert_eq!(ids, vec!["IPE_9", "IPE_5"]);
        assert!(plan.to_delete.iter().all(|m| !m.matched));
    }

    #[test]
    fn duplicate_remote_value_is_claimed_once() {
        let mut wanted = desired(&["10.0.0.0/24"]);
        let existing = vec![
            remote("IPE_1", Some("fabric.eastus-001"), "10.0.0.0/24"),
            remote("IPE_2", Some("fabric.eastus-002"), "10.0.0.0/24"),
        ];

        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].entry.id, "IPE_2");
    }

    #[test]
    fn second_desired_copy_is_created_when_only_one_exists() {
        let mut wanted = desired(&["10.0.0.0/24", "10.0.0.0/24"]);
        let existing = vec![remote("IPE_1", Some("fabric.eastus-001"), "10.0.0.0/24")];

        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        assert_eq!(plan.unchanged, 1);
        assert!(plan.to_delete.is_empty());
        assert_eq!(
            plan.to_create,
            vec![PlannedEntry {
                ip: "10.0.0.0/24".into(),
                name: "fabric.eastus-002".into(),
                index: 2,
            }]
        );
    }

    #[test]
    fn duplicate_desired_values_keep_matching_duplicates() {
        let mut wanted = desired(&["10.0.0.0/24", "10.0.0.0/24"]);
        let existing = vec![
            remote("IPE_1", Some("fabric.eastus-001"), "10.0.0.0/24"),
            remote("IPE_2", Some("fabric.eastus-002"), "10.0.0.0/24"),
        ];

        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        assert!(plan.to_delete.is_empty());
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.unchanged, 2);
    }

    #[test]
    fn planning_is_deterministic() {
        let ranges = ["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24"];
        let existing = vec![
            remote("IPE_1", Some("fabric.eastus-001"), "10.0.0.0/24"),
            remote("IPE_7", Some("fabric.eastus-007"), "10.0.7.0/24"),
            remote("IPE_X", Some("corp"), "10.0.2.0/24"),
        ];

        let first = compute_plan(&mut desired(&ranges), &existing, PREFIX);
        let second = compute_plan(&mut desired(&ranges), &existing, PREFIX);

        assert_eq!(first, second);
    }

    #[test]
    fn every_desired_range_is_created_or_unchanged() {
        let ranges: Vec<String> = (0..50).map(|i| format!("10.1.{}.0/24", i)).collect();
        let refs: Vec<&str> = ranges.iter().map(String::as_str).collect();
        let existing: Vec<RemoteEntry> = (0..80)
            .step_by(3)
            .map(|i| {
                remote(
                    &format!("IPE_{}", i),
                    Some(entry_name(PREFIX, i).as_str()),
                    &format!("10.1.{}.0/24", i),
                )
            })
            .collect();
        let managed = managed_entries(&existing, PREFIX).len();

        let mut wanted = desired(&refs);
        let plan = compute_plan(&mut wanted, &existing, PREFIX);

        assert_eq!(plan.to_create.len() + plan.unchanged, wanted.len());
        assert_eq!(plan.to_delete.len() + plan.unchanged, managed);
        for (i, d) in wanted.iter().enumerate() {
            let planned = plan.to_create.iter().find(|p| p.index == i + 1);
            assert_eq!(planned.is_some(), !d.matched);
            if let Some(p) = planned {
                assert_eq!(p.name, entry_name(PREFIX, i));
            }
        }
    }
}
