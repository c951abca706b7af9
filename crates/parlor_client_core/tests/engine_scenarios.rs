use std::time::Duration;

use parlor_client_core::{
	ClientAction, ClientConfig, Command, Engine, GatedActions, LogEntry, RecordingSink, RequestKind, SessionEvent,
	UiEvent,
};
use parlor_domain::{ChannelId, Rank, UserId};
use parlor_protocol::{Endpoint, Response};
use serde_json::{Value, json};

const LOBBY: ChannelId = ChannelId(101);

fn engine() -> Engine<RecordingSink> {
	Engine::new(&ClientConfig::default(), RecordingSink::new())
}

fn ok(payload: Value) -> Response {
	Response::new(200, payload)
}

fn sent(actions: &[ClientAction]) -> Vec<RequestKind> {
	actions
		.iter()
		.filter_map(|a| match a {
			ClientAction::Send { kind, .. } => Some(kind.clone()),
			_ => None,
		})
		.collect()
}

fn timers(actions: &[ClientAction]) -> Vec<Duration> {
	actions
		.iter()
		.filter_map(|a| match a {
			ClientAction::ScheduleTimer(d) => Some(*d),
			_ => None,
		})
		.collect()
}

fn sign_in(engine: &mut Engine<RecordingSink>) {
	let actions = engine.submit(Command::sign_in("ann", "pw")).unwrap();
	assert_eq!(sent(&actions), vec![RequestKind::SignIn]);
	let follow = engine.handle_response(
		RequestKind::SignIn,
		Ok(ok(json!({ "session": "tok-1", "userID": 1, "username": "ann" }))),
	);
	assert!(follow.is_empty());
}

/// Signs in and joins `LOBBY`, leaving the first poll outstanding.
fn join_lobby(engine: &mut Engine<RecordingSink>, rank: i32) -> Vec<ClientAction> {
	sign_in(engine);
	let actions = engine.submit(Command::JoinChannel { channel: LOBBY }).unwrap();
	assert_eq!(sent(&actions), vec![RequestKind::Join(LOBBY)]);
	engine.handle_response(
		RequestKind::Join(LOBBY),
		Ok(ok(json!({ "rank": rank, "details": { "name": "Lobby" } }))),
	)
}

#[test]
fn sign_in_join_and_one_chat_message() {
	let mut engine = engine();
	let after_join = join_lobby(&mut engine, 2);

	assert_eq!(
		sent(&after_join),
		vec![
			RequestKind::Poll(LOBBY),
			RequestKind::MemberList(LOBBY),
			RequestKind::Permissions {
				channel: LOBBY,
				open_list: false
			},
			RequestKind::Groups {
				channel: LOBBY,
				open_list: false
			},
		]
	);
	assert_eq!(engine.state().session.channel_id(), Some(LOBBY));
	assert_eq!(engine.state().session.user_rank(), Some(Rank(2)));
	assert!(engine.sink().events.iter().any(|e| matches!(
		e,
		UiEvent::Session(SessionEvent::ChannelJoined { channel: LOBBY, rank: Rank(2), .. })
	)));

	let next = engine.handle_response(
		RequestKind::Poll(LOBBY),
		Ok(ok(json!({ "messages": [
			{ "type": 5, "message": "hello", "senderName": "bob", "senderRank": 1, "userID": 2 }
		] }))),
	);

	assert_eq!(engine.state().log.len(), 1);
	match engine.state().log.last() {
		Some(LogEntry::Chat { sender_name, text, .. }) => {
			assert_eq!(sender_name, "bob");
			assert_eq!(text, "hello");
		}
		other => panic!("expected a chat line, got {other:?}"),
	}
	assert_eq!(timers(&next), vec![Duration::from_millis(2000)]);
}

#[test]
fn removal_event_resets_channel_and_stops_polling() {
	let mut engine = engine();
	join_lobby(&mut engine, 2);

	let next = engine.handle_response(
		RequestKind::Poll(LOBBY),
		Ok(ok(json!({ "messages": [
			{ "type": 3, "message": "You have been kicked" },
			{ "type": 10 }
		] }))),
	);

	assert!(sent(&next).is_empty());
	assert!(timers(&next).is_empty());
	assert_eq!(engine.state().session.channel_id(), None);
	assert_eq!(engine.state().session.user_rank(), None);
	assert!(!engine.poll().is_looping());
	assert_eq!(engine.state().gated(), GatedActions::default());
	assert!(engine.sink().events.iter().any(|e| matches!(
		e,
		UiEvent::Session(SessionEvent::ChannelLeft { channel: LOBBY })
	)));

	// The timer never re-arms, and late list replies for the old channel are dropped.
	assert!(engine.handle_timer().is_empty());
	engine.handle_response(
		RequestKind::MemberList(LOBBY),
		Ok(ok(json!({ "users": [ { "userID": 9, "username": "zed", "group": { "id": 0, "name": "Guest" } } ] }))),
	);
	assert!(engine.state().members.is_empty());
}

#[test]
fn unknown_event_type_is_reported_and_skipped() {
	let mut engine = engine();
	join_lobby(&mut engine, 2);
	engine.sink_mut().clear();

	engine.handle_response(
		RequestKind::Poll(LOBBY),
		Ok(ok(json!({ "messages": [
			{ "type": 5, "message": "first", "senderName": "bob" },
			{ "type": 99, "whatever": true },
			{ "type": 6, "userID": 7, "username": "cat", "group": { "id": 0, "name": "Guest" } }
		] }))),
	);

	assert_eq!(engine.state().log.len(), 1);
	assert!(engine.state().members.contains(UserId(7)));
	let diagnostics: Vec<&str> = engine.sink().diagnostics().collect();
	assert_eq!(diagnostics.len(), 1);
	assert!(diagnostics[0].contains("99"), "diagnostic was {:?}", diagnostics[0]);
}

#[test]
fn poll_backoff_follows_batch_contents() {
	let mut engine = engine();
	join_lobby(&mut engine, 2);

	let idle = engine.handle_response(RequestKind::Poll(LOBBY), Ok(Response::new(204, json!({}))));
	assert_eq!(timers(&idle), vec![Duration::from_millis(5000)]);

	let fired = engine.handle_timer();
	assert_eq!(sent(&fired), vec![RequestKind::Poll(LOBBY)]);

	let busy = engine.handle_response(
		RequestKind::Poll(LOBBY),
		Ok(ok(json!({ "messages": [ { "type": 4, "message": "Server restarting" } ] }))),
	);
	assert_eq!(timers(&busy), vec![Duration::from_millis(2000)]);

	let empty_batch = engine.handle_timer();
	assert_eq!(sent(&empty_batch), vec![RequestKind::Poll(LOBBY)]);
	let idle = engine.handle_response(RequestKind::Poll(LOBBY), Ok(ok(json!({ "messages": [] }))));
	assert_eq!(timers(&idle), vec![Duration::from_millis(5000)]);
}

#[test]
fn start_polling_is_single_flight() {
	let mut engine = engine();
	join_lobby(&mut engine, 2);

	// The join already has a poll outstanding.
	assert!(engine.submit(Command::StartPolling).unwrap().is_empty());

	let next = engine.handle_response(RequestKind::Poll(LOBBY), Ok(Response::new(204, json!({}))));
	assert_eq!(timers(&next).len(), 1);
	// A timer is armed; starting again must not add a second loop.
	assert!(engine.submit(Command::StartPolling).unwrap().is_empty());
}

#[test]
fn failed_poll_stops_the_loop_until_restarted() {
	let mut engine = engine();
	join_lobby(&mut engine, 2);

	let next = engine.handle_response(
		RequestKind::Poll(LOBBY),
		Ok(Response::new(403, json!({ "message": "Not in channel" }))),
	);
	assert!(next.is_empty());
	assert!(!engine.poll().is_looping());
	assert!(
		engine
			.sink()
			.errors()
			.any(|(_, message)| message == "Not in channel")
	);

	let restarted = engine.submit(Command::StartPolling).unwrap();
	assert_eq!(sent(&restarted), vec![RequestKind::Poll(LOBBY)]);
}

#[test]
fn permission_gating_follows_rank() {
	let mut engine = engine();
	join_lobby(&mut engine, 5);

	engine.handle_response(
		RequestKind::Permissions {
			channel: LOBBY,
			open_list: false,
		},
		Ok(ok(json!({ "permissions": [
			{ "permissionID": 1, "name": "talk", "value": 3 },
			{ "permissionID": 2, "name": "reset", "value": 10 }
		] }))),
	);

	let gated = engine.state().gated();
	assert!(gated.can_talk);
	assert!(!gated.can_reset);
	assert!(!gated.can_temp_ban);
	// Not opened as a list, so the visible store stays detached.
	assert!(engine.state().permissions.is_empty());
	assert!(
		engine
			.sink()
			.events
			.iter()
			.any(|e| matches!(e, UiEvent::GatedActionsChanged(g) if g.can_talk))
	);
}

#[test]
fn moderation_success_logs_notice_and_polls() {
	let mut engine = engine();
	join_lobby(&mut engine, 5);
	engine.handle_response(RequestKind::Poll(LOBBY), Ok(Response::new(204, json!({}))));

	let actions = engine
		.submit(Command::Kick {
			target: "bob".into(),
		})
		.unwrap();
	let [ClientAction::Send { kind, request }] = actions.as_slice() else {
		panic!("expected one request, got {actions:?}");
	};
	assert_eq!(request.endpoint, Endpoint::Kick(LOBBY));

	let next = engine.handle_response(kind.clone(), Ok(ok(json!({ "message": "bob was kicked" }))));
	assert!(matches!(
		engine.state().log.last(),
		Some(LogEntry::Notice { text, .. }) if text == "bob was kicked"
	));
	// The idle timer is replaced by an immediate poll.
	assert_eq!(next.first(), Some(&ClientAction::CancelTimer));
	assert_eq!(sent(&next), vec![RequestKind::Poll(LOBBY)]);
}

#[test]
fn reset_requires_accepted_status() {
	let mut engine = engine();
	join_lobby(&mut engine, 5);

	let kind = RequestKind::Moderation {
		channel: LOBBY,
		expect_accepted: true,
	};
	let next = engine.handle_response(kind, Ok(ok(json!({ "message": "reset" }))));
	assert!(next.is_empty());
	assert_eq!(engine.state().log.len(), 0);
	assert!(engine.sink().errors().any(|(context, _)| context == "channel command"));
}

#[test]
fn rejected_commands_send_nothing() {
	let mut engine = engine();
	assert!(engine.submit(Command::LeaveChannel).is_err());
	assert!(engine.submit(Command::send_message("hi").unwrap()).is_err());
}

#[test]
fn transport_failure_on_poll_reports_path() {
	let mut engine = engine();
	join_lobby(&mut engine, 2);

	let next = engine.handle_response(
		RequestKind::Poll(LOBBY),
		Err(parlor_client_core::TransportError::Timeout {
			path: "channel/101/messages/get/".to_string(),
		}),
	);
	assert!(next.is_empty());
	assert!(!engine.poll().is_looping());
	assert!(
		engine
			.sink()
			.errors()
			.any(|(context, _)| context == "channel/101/messages/get/")
	);
}

#[test]
fn sign_in_with_default_channel_joins_it() {
	let mut engine = engine();
	engine.submit(Command::sign_in("ann", "pw")).unwrap();
	let follow = engine.handle_response(
		RequestKind::SignIn,
		Ok(ok(json!({ "session": "tok", "userID": 1, "username": "ann", "defaultChannel": 120 }))),
	);
	assert_eq!(sent(&follow), vec![RequestKind::Join(ChannelId(120))]);

	let mut engine = self::engine();
	engine.submit(Command::sign_in("ann", "pw")).unwrap();
	let follow = engine.handle_response(
		RequestKind::SignIn,
		Ok(ok(json!({ "session": "tok", "userID": 1, "username": "ann", "defaultChannel": 5 }))),
	);
	assert!(follow.is_empty());
}

#[test]
fn leave_confirms_then_drains_once() {
	let mut engine = engine();
	join_lobby(&mut engine, 2);
	engine.handle_response(RequestKind::Poll(LOBBY), Ok(Response::new(204, json!({}))));

	let actions = engine.submit(Command::LeaveChannel).unwrap();
	assert_eq!(sent(&actions), vec![RequestKind::Leave(LOBBY)]);

	let after = engine.handle_response(RequestKind::Leave(LOBBY), Ok(ok(json!({ "message": "Left Lobby" }))));
	assert_eq!(after.first(), Some(&ClientAction::CancelTimer));
	assert_eq!(sent(&after), vec![RequestKind::Poll(LOBBY)]);
	assert_eq!(engine.state().session.channel_id(), None);

	// The drain poll ends the loop without re-arming.
	let done = engine.handle_response(RequestKind::Poll(LOBBY), Ok(Response::new(204, json!({}))));
	assert!(done.is_empty());
}

#[test]
fn signing_in_again_tears_down_the_channel() {
	let mut engine = engine();
	join_lobby(&mut engine, 5);
	engine.handle_response(
		RequestKind::Permissions {
			channel: LOBBY,
			open_list: false,
		},
		Ok(ok(json!({ "permissions": [ { "permissionID": 1, "name": "talk", "value": 0 } ] }))),
	);
	engine.handle_response(
		RequestKind::MemberList(LOBBY),
		Ok(ok(json!({ "users": [ { "userID": 1, "username": "ann", "group": { "id": 5, "name": "Owner" } } ] }))),
	);
	engine.handle_response(RequestKind::Poll(LOBBY), Ok(Response::new(204, json!({}))));
	assert!(engine.state().gated().can_talk);
	assert_eq!(engine.state().members.len(), 1);

	engine.submit(Command::sign_in("bob", "pw")).unwrap();
	let follow = engine.handle_response(
		RequestKind::SignIn,
		Ok(ok(json!({ "session": "tok-2", "userID": 2, "username": "bob" }))),
	);

	assert_eq!(follow, vec![ClientAction::CancelTimer]);
	assert_eq!(engine.state().session.channel_id(), None);
	assert_eq!(engine.state().session.username(), Some("bob"));
	assert_eq!(engine.state().gated(), GatedActions::default());
	assert!(engine.state().members.is_empty());
	assert!(!engine.poll().is_looping());
	assert_eq!(engine.poll().channel(), None);
	assert!(engine.handle_timer().is_empty());
	assert!(engine.sink().events.iter().any(|e| matches!(
		e,
		UiEvent::Session(SessionEvent::ChannelLeft { channel: LOBBY })
	)));
}
