use parlor_client_core::store::{ClosedPolicy, ProjectionStore, compare_entries};
use parlor_domain::{GroupRef, MemberEntry, Rank, UserId};
use proptest::prelude::*;

fn member(id: u32, name: &str, rank: i32) -> MemberEntry {
	MemberEntry {
		user_id: UserId(id),
		username: name.to_string(),
		group: GroupRef::new(Rank(rank), "Group"),
	}
}

fn arb_member() -> impl Strategy<Value = MemberEntry> {
	(0u32..40, "[a-zA-Z]{1,6}", 0i32..5).prop_map(|(id, name, rank)| member(id, &name, rank))
}

fn keys(store: &ProjectionStore<MemberEntry>) -> Vec<UserId> {
	store.iter().map(|m| m.user_id).collect()
}

proptest! {
	#[test]
	fn adding_twice_equals_adding_once(entries in prop::collection::vec(arb_member(), 0..30)) {
		let mut once = ProjectionStore::new(ClosedPolicy::Apply);
		let mut twice = ProjectionStore::new(ClosedPolicy::Apply);
		for e in &entries {
			once.add(e.clone());
			twice.add(e.clone());
			twice.add(e.clone());
		}
		once.sort();
		twice.sort();
		prop_assert_eq!(once.iter().cloned().collect::<Vec<_>>(), twice.iter().cloned().collect::<Vec<_>>());
	}

	#[test]
	fn keys_stay_unique(entries in prop::collection::vec(arb_member(), 0..30)) {
		let mut store = ProjectionStore::new(ClosedPolicy::Apply);
		for e in entries {
			store.upsert(e);
		}
		let mut seen = keys(&store);
		let len = seen.len();
		seen.sort();
		seen.dedup();
		prop_assert_eq!(seen.len(), len);
	}

	#[test]
	fn sorted_order_ignores_insertion_order(entries in prop::collection::vec(arb_member(), 0..30)) {
		let mut forward = ProjectionStore::new(ClosedPolicy::Apply);
		forward.load(entries.clone());

		// Same surviving entries (first add per key wins), inserted in reverse.
		let survivors: Vec<MemberEntry> = forward.iter().cloned().collect();
		let mut backward = ProjectionStore::new(ClosedPolicy::Apply);
		backward.load(survivors.into_iter().rev());

		prop_assert_eq!(keys(&forward), keys(&backward));
		let rows: Vec<&MemberEntry> = forward.iter().collect();
		for pair in rows.windows(2) {
			prop_assert!(compare_entries(pair[0], pair[1]).is_le());
		}
	}

	#[test]
	fn detached_drop_store_ignores_mutations(entries in prop::collection::vec(arb_member(), 1..10)) {
		let mut store = ProjectionStore::new(ClosedPolicy::Drop);
		for e in entries {
			prop_assert!(!store.add(e.clone()));
			prop_assert!(!store.upsert(e));
		}
		prop_assert!(store.is_empty());
	}
}

#[test]
fn update_before_add_leaves_the_added_row() {
	let mut store = ProjectionStore::new(ClosedPolicy::Apply);
	assert!(!store.update(member(3, "carl", 2)));
	assert!(store.add(member(3, "carl", 1)));
	assert_eq!(store.get(UserId(3)).map(|m| m.group.rank), Some(Rank(1)));
}
