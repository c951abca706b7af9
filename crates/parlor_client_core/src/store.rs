use core::cmp::Ordering;
use core::fmt::Debug;

use parlor_domain::{BanEntry, ChannelId, ChannelSummary, GroupEntry, MemberEntry, PermissionEntry, PermissionId, Rank, UserId};

/// A row type that can live in a [`ProjectionStore`].
pub trait ListEntry: Clone + Debug {
	type Key: Copy + Eq + Ord + Debug;

	fn key(&self) -> Self::Key;

	/// Text the list is sorted by.
	fn sort_label(&self) -> &str;
}

impl ListEntry for MemberEntry {
	type Key = UserId;

	fn key(&self) -> UserId {
		self.user_id
	}

	fn sort_label(&self) -> &str {
		&self.username
	}
}

impl ListEntry for BanEntry {
	type Key = UserId;

	fn key(&self) -> UserId {
		self.user_id
	}

	fn sort_label(&self) -> &str {
		&self.username
	}
}

impl ListEntry for PermissionEntry {
	type Key = PermissionId;

	fn key(&self) -> PermissionId {
		self.id
	}

	fn sort_label(&self) -> &str {
		&self.name
	}
}

impl ListEntry for GroupEntry {
	type Key = Rank;

	fn key(&self) -> Rank {
		self.id
	}

	fn sort_label(&self) -> &str {
		&self.name
	}
}

impl ListEntry for ChannelSummary {
	type Key = ChannelId;

	fn key(&self) -> ChannelId {
		self.id
	}

	fn sort_label(&self) -> &str {
		&self.name
	}
}

/// What a detached store does with incoming mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedPolicy {
	/// Ignore them.
	Drop,
	/// Apply them anyway.
	Apply,
}

/// Case-folded label, then exact label, then key.
///
/// Folding is `to_lowercase`, not locale collation, so non-ASCII names may
/// order differently than a browser's `localeCompare` would.
pub fn compare_entries<E: ListEntry>(a: &E, b: &E) -> Ordering {
	let (la, lb) = (a.sort_label(), b.sort_label());
	la.to_lowercase()
		.cmp(&lb.to_lowercase())
		.then_with(|| la.cmp(lb))
		.then_with(|| a.key().cmp(&b.key()))
}

/// Keyed, ordered, optionally visible view over one kind of row.
#[derive(Debug, Clone)]
pub struct ProjectionStore<E: ListEntry> {
	entries: Vec<E>,
	attached: bool,
	policy: ClosedPolicy,
}

impl<E: ListEntry> ProjectionStore<E> {
	pub fn new(policy: ClosedPolicy) -> Self {
		Self {
			entries: Vec::new(),
			attached: false,
			policy,
		}
	}

	pub fn is_attached(&self) -> bool {
		self.attached
	}

	pub fn attach(&mut self) {
		self.attached = true;
	}

	pub fn detach(&mut self) {
		self.attached = false;
	}

	/// Whether mutations are currently applied.
	pub fn accepts(&self) -> bool {
		self.attached || self.policy == ClosedPolicy::Apply
	}

	fn position(&self, key: E::Key) -> Option<usize> {
		self.entries.iter().position(|e| e.key() == key)
	}

	pub fn get(&self, key: E::Key) -> Option<&E> {
		self.position(key).map(|i| &self.entries[i])
	}

	pub fn contains(&self, key: E::Key) -> bool {
		self.position(key).is_some()
	}

	pub fn iter(&self) -> impl Iterator<Item = &E> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Insert if the key is new. An existing entry is left untouched.
	pub fn add(&mut self, entry: E) -> bool {
		if !self.accepts() || self.contains(entry.key()) {
			return false;
		}
		self.entries.push(entry);
		true
	}

	/// Replace an existing entry in place; missing keys are ignored.
	pub fn update(&mut self, entry: E) -> bool {
		if !self.accepts() {
			return false;
		}
		match self.position(entry.key()) {
			Some(i) => {
				self.entries[i] = entry;
				true
			}
			None => false,
		}
	}

	/// Update when present, otherwise add.
	pub fn upsert(&mut self, entry: E) -> bool {
		if !self.accepts() {
			return false;
		}
		match self.position(entry.key()) {
			Some(i) => self.entries[i] = entry,
			None => self.entries.push(entry),
		}
		true
	}

	pub fn remove(&mut self, key: E::Key) -> bool {
		if !self.accepts() {
			return false;
		}
		match self.position(key) {
			Some(i) => {
				self.entries.remove(i);
				true
			}
			None => false,
		}
	}

	pub fn sort(&mut self) {
		self.entries.sort_by(compare_entries);
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Load a full snapshot and attach.
	pub fn load(&mut self, entries: impl IntoIterator<Item = E>) {
		self.entries.clear();
		self.attached = true;
		for entry in entries {
			self.add(entry);
		}
		self.sort();
	}

	/// Clear and detach.
	pub fn close(&mut self) {
		self.entries.clear();
		self.attached = false;
	}
}

#[cfg(test)]
mod tests {
	use parlor_domain::GroupRef;

	use super::*;

	fn member(id: u32, name: &str) -> MemberEntry {
		MemberEntry {
			user_id: UserId(id),
			username: name.to_string(),
			group: GroupRef::new(Rank(0), "Guest"),
		}
	}

	#[test]
	fn add_is_idempotent_by_key() {
		let mut store = ProjectionStore::new(ClosedPolicy::Apply);
		assert!(store.add(member(1, "ann")));
		assert!(!store.add(member(1, "someone else")));
		assert_eq!(store.len(), 1);
		assert_eq!(store.get(UserId(1)).unwrap().username, "ann");
	}

	#[test]
	fn update_only_touches_existing() {
		let mut store = ProjectionStore::new(ClosedPolicy::Apply);
		assert!(!store.update(member(1, "ann")));
		assert!(store.is_empty());
		store.add(member(1, "ann"));
		assert!(store.update(member(1, "anne")));
		assert_eq!(store.get(UserId(1)).unwrap().username, "anne");
	}

	#[test]
	fn detached_drop_store_ignores_mutations() {
		let mut store = ProjectionStore::new(ClosedPolicy::Drop);
		assert!(!store.add(member(1, "ann")));
		store.attach();
		assert!(store.add(member(1, "ann")));
		store.detach();
		assert!(!store.remove(UserId(1)));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn sort_is_case_folded_with_stable_ties() {
		let mut store = ProjectionStore::new(ClosedPolicy::Apply);
		store.add(member(3, "bob"));
		store.add(member(2, "Bob"));
		store.add(member(1, "alice"));
		store.add(member(4, "Bob"));
		store.sort();
		let keys: Vec<u32> = store.iter().map(|m| m.user_id.get()).collect();
		assert_eq!(keys, [1, 2, 4, 3]);
	}

	#[test]
	fn load_replaces_and_attaches() {
		let mut store = ProjectionStore::new(ClosedPolicy::Drop);
		store.load([member(2, "zed"), member(1, "amy"), member(2, "dup")]);
		assert!(store.is_attached());
		let names: Vec<&str> = store.iter().map(|m| m.username.as_str()).collect();
		assert_eq!(names, ["amy", "zed"]);
		store.close();
		assert!(store.is_empty());
		assert!(!store.is_attached());
	}
}
