use parlor_domain::{ChannelId, Colour};
use parlor_protocol::{ChannelEvent, decode_event};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::log::LogEntry;
use crate::sink::{ClientSink, ListKind, SessionEvent};
use crate::state::ClientState;

/// Summary of one applied poll batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
	pub applied: usize,
	pub skipped: usize,
	/// The batch told us we are no longer in the channel.
	pub removed: bool,
}

/// Apply a poll batch for `channel` in order.
///
/// Records that fail to decode are reported and skipped. Once the channel is
/// no longer current (left, or removed earlier in this batch) only log lines
/// are still applied.
pub fn apply_batch(
	state: &mut ClientState,
	sink: &mut impl ClientSink,
	channel: ChannelId,
	records: &[Value],
) -> BatchReport {
	let mut report = BatchReport::default();
	for record in records {
		let event = match decode_event(record) {
			Ok(event) => event,
			Err(e) => {
				warn!(%channel, error = %e, "skipping channel event");
				sink.on_diagnostic(&format!("Unhandled message: {e}"));
				report.skipped += 1;
				continue;
			}
		};

		if !state.session.is_current_channel(channel) && !is_log_line(&event) {
			debug!(%channel, kind = %event.kind(), "dropping event for a channel we are not in");
			report.skipped += 1;
			continue;
		}

		if apply_event(state, sink, channel, event) {
			report.removed = true;
		}
		report.applied += 1;
	}
	report
}

fn is_log_line(event: &ChannelEvent) -> bool {
	matches!(
		event,
		ChannelEvent::LocalSystemMessage(_) | ChannelEvent::GlobalSystemMessage(_) | ChannelEvent::ChatMessage(_)
	)
}

/// Apply one event. Returns true when it removed us from the channel.
pub fn apply_event(state: &mut ClientState, sink: &mut impl ClientSink, channel: ChannelId, event: ChannelEvent) -> bool {
	debug!(%channel, kind = %event.kind(), "apply event");
	match event {
		ChannelEvent::LocalSystemMessage(msg) => state.append(
			sink,
			LogEntry::System {
				text: msg.message,
				colour: msg.colour.unwrap_or(Colour::BLACK),
				emphasis: false,
			},
		),
		ChannelEvent::GlobalSystemMessage(msg) => state.append(
			sink,
			LogEntry::System {
				text: msg.message,
				colour: msg.colour.unwrap_or(Colour::BLACK),
				emphasis: true,
			},
		),
		ChannelEvent::ChatMessage(msg) => {
			let rank_name = msg
				.sender_rank
				.and_then(|r| state.session.group(r))
				.map(|g| g.name.clone());
			state.append(
				sink,
				LogEntry::Chat {
					sender_id: msg.sender_id,
					sender_name: msg.sender_name,
					sender_rank: msg.sender_rank,
					rank_name,
					text: msg.message,
				},
			);
		}
		ChannelEvent::MemberAdded(entry) => {
			if state.members.add(entry) {
				state.members.sort();
				sink.on_list_changed(ListKind::Members);
			}
		}
		ChannelEvent::MemberRemoved { user_id } => {
			if state.members.remove(user_id) {
				sink.on_list_changed(ListKind::Members);
			}
		}
		ChannelEvent::MemberUpdated(entry) => {
			if state.members.update(entry) {
				sink.on_list_changed(ListKind::Members);
			}
		}
		ChannelEvent::PermissionChanged(entry) => {
			if state.permissions.upsert(entry.clone()) {
				state.permissions.sort();
				sink.on_list_changed(ListKind::Permissions);
			}
			state.session.upsert_permission(entry);
			state.refresh_gated(sink);
		}
		ChannelEvent::RemovedFromChannel => {
			if state.session.is_current_channel(channel) {
				info!(%channel, "removed from channel");
				state.clear_channel(sink);
				return true;
			}
		}
		ChannelEvent::RankListAdded(entry) => {
			if state.ranks.add(entry) {
				state.ranks.sort();
				sink.on_list_changed(ListKind::Ranks);
			}
		}
		ChannelEvent::RankListRemoved { user_id } => {
			if state.ranks.remove(user_id) {
				sink.on_list_changed(ListKind::Ranks);
			}
		}
		ChannelEvent::RankListUpdated(entry) => {
			if state.ranks.update(entry) {
				sink.on_list_changed(ListKind::Ranks);
			}
		}
		ChannelEvent::BanListAdded(entry) => {
			if state.bans.add(entry) {
				state.bans.sort();
				sink.on_list_changed(ListKind::Bans);
			}
		}
		ChannelEvent::BanListRemoved { user_id } => {
			if state.bans.remove(user_id) {
				sink.on_list_changed(ListKind::Bans);
			}
		}
		ChannelEvent::RankNameChanged { rank, name } => {
			state.session.rename_group(rank, &name);
			if let Some(mut group) = state.groups.get(rank).cloned() {
				group.name = name;
				if state.groups.update(group) {
					state.groups.sort();
					sink.on_list_changed(ListKind::Groups);
				}
			}
		}
		ChannelEvent::ChannelDetailsChanged(details) => {
			state.session.set_channel_details(details.clone());
			sink.on_session_changed(&SessionEvent::DetailsChanged(details));
		}
		ChannelEvent::RankChanged { user_id, rank } => {
			if state.session.user_id() == Some(user_id) {
				info!(%rank, "own rank changed");
				state.session.set_user_rank(rank);
				sink.on_session_changed(&SessionEvent::RankChanged { rank });
				state.refresh_gated(sink);
			}
		}
	}
	false
}

#[cfg(test)]
mod tests {
	use parlor_domain::{ChannelDetails, GroupEntry, GroupRef, MemberEntry, PermissionId, Rank, SessionToken, UserId};
	use serde_json::json;

	use super::*;
	use crate::sink::{RecordingSink, UiEvent};

	const C: ChannelId = ChannelId(101);

	fn joined() -> ClientState {
		let mut state = ClientState::new(100);
		let mut sink = RecordingSink::new();
		state.session.sign_in(SessionToken::new("tok").unwrap(), UserId(1), "ann");
		state.enter_channel(&mut sink, C, Rank(2), ChannelDetails::default());
		state
	}

	fn member_added(id: u32, name: &str) -> Value {
		json!({ "type": 6, "userID": id, "username": name, "group": { "id": 0, "name": "Guest" } })
	}

	fn member_updated(id: u32, name: &str) -> Value {
		json!({ "type": 8, "userID": id, "username": name, "group": { "id": 0, "name": "Guest" } })
	}

	#[test]
	fn add_then_update_keeps_update() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		apply_batch(&mut state, &mut sink, C, &[member_added(1, "A"), member_updated(1, "B")]);
		assert_eq!(state.members.get(UserId(1)).unwrap().username, "B");
	}

	#[test]
	fn update_then_add_keeps_add() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		apply_batch(&mut state, &mut sink, C, &[member_updated(1, "B"), member_added(1, "A")]);
		assert_eq!(state.members.get(UserId(1)).unwrap().username, "A");
	}

	#[test]
	fn rank_list_events_dropped_while_detached() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		let add = json!({ "type": 11, "userID": 4, "username": "dan", "group": { "id": 1, "name": "Member" } });

		apply_batch(&mut state, &mut sink, C, std::slice::from_ref(&add));
		assert!(state.ranks.is_empty());

		state.ranks.attach();
		apply_batch(&mut state, &mut sink, C, &[add]);
		assert_eq!(state.ranks.len(), 1);
		assert!(sink.events.contains(&UiEvent::ListChanged(ListKind::Ranks)));
	}

	#[test]
	fn chat_line_carries_group_name() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		state.session.replace_groups([GroupEntry {
			id: Rank(2),
			name: "Moderator".to_string(),
			icon: None,
			group_type: None,
		}]);
		apply_batch(
			&mut state,
			&mut sink,
			C,
			&[json!({ "type": 5, "message": "hi", "senderName": "bob", "senderRank": 2 })],
		);
		match state.log.last() {
			Some(LogEntry::Chat { rank_name, .. }) => assert_eq!(rank_name.as_deref(), Some("Moderator")),
			other => panic!("unexpected log entry {other:?}"),
		}
	}

	#[test]
	fn rank_change_for_other_user_is_ignored() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		apply_batch(&mut state, &mut sink, C, &[json!({ "type": 18, "userID": 9, "rank": 5 })]);
		assert_eq!(state.session.user_rank(), Some(Rank(2)));

		apply_batch(&mut state, &mut sink, C, &[json!({ "type": 18, "userID": 1, "rank": 5 })]);
		assert_eq!(state.session.user_rank(), Some(Rank(5)));
	}

	#[test]
	fn removal_for_other_channel_is_ignored() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		let report = apply_batch(&mut state, &mut sink, ChannelId(7), &[json!({ "type": 10 })]);
		assert!(!report.removed);
		assert_eq!(state.session.channel_id(), Some(C));
	}

	#[test]
	fn events_after_removal_only_touch_the_log() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		let report = apply_batch(
			&mut state,
			&mut sink,
			C,
			&[
				json!({ "type": 10 }),
				member_added(3, "late"),
				json!({ "type": 3, "message": "You were kicked" }),
			],
		);
		assert!(report.removed);
		assert_eq!(report.applied, 2);
		assert_eq!(report.skipped, 1);
		assert!(state.members.is_empty());
		assert_eq!(state.log.last().map(LogEntry::text), Some("You were kicked"));
	}

	#[test]
	fn permission_change_refreshes_snapshot_and_gating() {
		let mut state = joined();
		let mut sink = RecordingSink::new();

		apply_batch(
			&mut state,
			&mut sink,
			C,
			&[json!({ "type": 9, "permissionID": 1, "name": "Talk", "value": 2 })],
		);
		assert_eq!(state.session.permission("talk").map(|p| p.value), Some(Rank(2)));
		assert!(state.gated().can_talk);
		assert!(sink.events.iter().any(|e| matches!(e, UiEvent::GatedActionsChanged(g) if g.can_talk)));
		// Detached permission list is left alone.
		assert!(state.permissions.is_empty());

		state.permissions.attach();
		sink.clear();
		apply_batch(
			&mut state,
			&mut sink,
			C,
			&[json!({ "type": 9, "permissionID": 1, "name": "TALK", "value": 3 })],
		);
		assert_eq!(state.session.permissions().count(), 1);
		assert_eq!(state.session.permission("Talk").map(|p| p.value), Some(Rank(3)));
		assert!(!state.gated().can_talk);
		assert_eq!(state.permissions.get(PermissionId(1)).map(|p| p.value), Some(Rank(3)));
		assert!(sink.events.contains(&UiEvent::ListChanged(ListKind::Permissions)));
	}

	#[test]
	fn ban_list_follows_attachment() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		let add = json!({ "type": 14, "userID": 4, "username": "dan" });
		let remove = json!({ "type": 15, "userID": 4 });

		apply_batch(&mut state, &mut sink, C, std::slice::from_ref(&add));
		assert!(state.bans.is_empty());
		assert!(sink.events.is_empty());

		state.bans.attach();
		apply_batch(&mut state, &mut sink, C, std::slice::from_ref(&add));
		assert!(state.bans.contains(UserId(4)));
		assert!(sink.events.contains(&UiEvent::ListChanged(ListKind::Bans)));

		state.bans.detach();
		apply_batch(&mut state, &mut sink, C, std::slice::from_ref(&remove));
		assert!(state.bans.contains(UserId(4)));

		state.bans.attach();
		apply_batch(&mut state, &mut sink, C, &[remove]);
		assert!(state.bans.is_empty());
	}

	#[test]
	fn rank_list_update_needs_attachment_and_existing_row() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		let update = json!({ "type": 13, "userID": 4, "username": "dan", "group": { "id": 3, "name": "Helper" } });

		apply_batch(&mut state, &mut sink, C, std::slice::from_ref(&update));
		assert!(state.ranks.is_empty());

		state.ranks.load([MemberEntry {
			user_id: UserId(4),
			username: "dan".to_string(),
			group: GroupRef::new(Rank(1), "Member"),
		}]);
		state.ranks.detach();
		apply_batch(&mut state, &mut sink, C, std::slice::from_ref(&update));
		assert_eq!(state.ranks.get(UserId(4)).map(|r| r.group.rank), Some(Rank(1)));

		state.ranks.attach();
		apply_batch(&mut state, &mut sink, C, &[update]);
		assert_eq!(state.ranks.get(UserId(4)).map(|r| r.group.rank), Some(Rank(3)));
		assert!(sink.events.contains(&UiEvent::ListChanged(ListKind::Ranks)));
	}

	#[test]
	fn rank_rename_updates_cache_and_open_group_list() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		let member = GroupEntry {
			id: Rank(2),
			name: "Member".to_string(),
			icon: None,
			group_type: None,
		};
		state.session.replace_groups([member.clone()]);

		apply_batch(&mut state, &mut sink, C, &[json!({ "type": 16, "rankID": 2, "rankName": "Regular" })]);
		assert_eq!(state.session.group(Rank(2)).map(|g| g.name.as_str()), Some("Regular"));
		assert!(state.groups.is_empty());

		state.groups.load([member]);
		apply_batch(&mut state, &mut sink, C, &[json!({ "type": 16, "rankID": 2, "rankName": "Veteran" })]);
		assert_eq!(state.groups.get(Rank(2)).map(|g| g.name.as_str()), Some("Veteran"));
		assert!(sink.events.contains(&UiEvent::ListChanged(ListKind::Groups)));
	}

	#[test]
	fn details_change_replaces_cached_details() {
		let mut state = joined();
		let mut sink = RecordingSink::new();
		let record = json!({
			"id": 4,
			"type": 17,
			"name": "Lobby",
			"openingMessage": "Welcome back",
			"messageColour": -16777216,
			"owner": { "id": 1, "name": "ann" }
		});

		let report = apply_batch(&mut state, &mut sink, C, std::slice::from_ref(&record));
		assert_eq!(report.applied, 1);
		assert_eq!(report.skipped, 0);
		let details = state.session.channel_details().cloned().unwrap();
		assert_eq!(details.name, "Lobby");
		assert_eq!(details.opening_message.as_deref(), Some("Welcome back"));
		assert!(sink.events.contains(&UiEvent::Session(SessionEvent::DetailsChanged(details))));

		// Details for a channel we are not in are not applied.
		let report = apply_batch(&mut state, &mut sink, ChannelId(7), &[record]);
		assert_eq!(report.skipped, 1);
	}
}
