use std::time::Duration;

use parlor_domain::ChannelId;
use parlor_protocol::{
	BanListPayload, ChannelDirectoryPayload, ChannelLookupPayload, Endpoint, EventBatchPayload, GroupsPayload,
	JoinPayload, LoginPayload, MemberListPayload, PermissionsPayload, RankListPayload, Request, Response,
	ResponseStatus,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::dispatch::apply_batch;
use crate::error::{ClientCoreError, TransportError};
use crate::gateway::{Command, RequestKind, build_request, list_request};
use crate::log::{LogEntry, NoticeTone};
use crate::poll::{PollAction, PollLoop, PollOutcome};
use crate::sink::{ClientSink, ListKind, SessionEvent};
use crate::state::ClientState;

/// Work the engine needs done outside itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
	/// Perform the request and feed the result back through `handle_response`.
	Send { kind: RequestKind, request: Request },
	/// Arm the poll timer; a later arm replaces an earlier one.
	ScheduleTimer(Duration),
	CancelTimer,
}

/// Synchronous core of the client.
///
/// Owns the state and the poll loop. It performs no I/O: every method returns
/// the actions its caller must carry out.
pub struct Engine<S: ClientSink> {
	state: ClientState,
	poll: PollLoop,
	sink: S,
}

impl<S: ClientSink> Engine<S> {
	pub fn new(config: &ClientConfig, sink: S) -> Self {
		Self {
			state: ClientState::new(config.message_log_capacity),
			poll: PollLoop::new(config.poll),
			sink,
		}
	}

	pub fn state(&self) -> &ClientState {
		&self.state
	}

	pub fn poll(&self) -> &PollLoop {
		&self.poll
	}

	pub fn sink(&self) -> &S {
		&self.sink
	}

	pub fn sink_mut(&mut self) -> &mut S {
		&mut self.sink
	}

	/// Run an operator command. Errors here mean nothing was sent.
	pub fn submit(&mut self, command: Command) -> Result<Vec<ClientAction>, ClientCoreError> {
		debug!(command = command.name(), "submit");
		match command {
			Command::ClearChannel => return Ok(self.clear_channel(true)),
			Command::CloseLists => {
				for kind in [
					ListKind::Ranks,
					ListKind::Bans,
					ListKind::Permissions,
					ListKind::Groups,
					ListKind::Channels,
				] {
					self.state.close_list(&mut self.sink, kind);
				}
				return Ok(Vec::new());
			}
			Command::StartPolling => {
				let (_, channel) = self.state.session.channel_scope()?;
				let actions = self.poll.start(channel);
				return Ok(self.poll_actions(actions));
			}
			Command::StopPolling => {
				let actions = self.poll.stop();
				return Ok(self.poll_actions(actions));
			}
			_ => {}
		}

		Ok(build_request(&self.state.session, &command)?
			.map(|(kind, request)| vec![ClientAction::Send { kind, request }])
			.unwrap_or_default())
	}

	/// The poll timer fired.
	pub fn handle_timer(&mut self) -> Vec<ClientAction> {
		let actions = self.poll.on_timer();
		self.poll_actions(actions)
	}

	/// Sign-out request to flush before the process exits, if signed in.
	pub fn shutdown(&mut self) -> Vec<ClientAction> {
		let halted = self.poll.halt();
		let mut actions = self.poll_actions(halted);
		if let Ok(token) = self.state.session.token() {
			actions.push(ClientAction::Send {
				kind: RequestKind::SignOut,
				request: Request::logout(token),
			});
		}
		actions
	}

	/// Route the outcome of a request issued through [`ClientAction::Send`].
	pub fn handle_response(&mut self, kind: RequestKind, result: Result<Response, TransportError>) -> Vec<ClientAction> {
		let response = match result {
			Ok(response) => response,
			Err(e) => {
				warn!(request = kind.context(), error = %e, "request failed");
				self.sink.on_error(e.path(), &e.to_string());
				if let RequestKind::Poll(channel) = kind {
					return self.finish_poll(channel, PollOutcome::Failed);
				}
				return Vec::new();
			}
		};
		debug!(request = kind.context(), status = response.status, "response");

		match kind {
			RequestKind::Poll(channel) => self.on_poll(channel, &response),
			RequestKind::Moderation {
				channel,
				expect_accepted,
			} => {
				let expected = if expect_accepted {
					ResponseStatus::Accepted
				} else {
					ResponseStatus::Ok
				};
				if response.status() != expected {
					self.report_failure(&kind, &response);
					return Vec::new();
				}
				if let Some(message) = response.message().filter(|m| !m.is_empty()) {
					self.notice(message, NoticeTone::Success);
				}
				self.poll_now(channel)
			}
			_ if response.status() != ResponseStatus::Ok => {
				self.report_failure(&kind, &response);
				Vec::new()
			}
			RequestKind::SignIn => self.on_signed_in(&kind, &response),
			RequestKind::SendMessage(channel) => self.poll_now(channel),
			RequestKind::SignOut => {
				info!("signed out");
				let halted = self.poll.halt();
				let actions = self.poll_actions(halted);
				self.state.sign_out(&mut self.sink);
				actions
			}
			RequestKind::CreateAccount { login_name, password } => {
				if let Some(message) = response.message() {
					self.notice(message, NoticeTone::Success);
				}
				info!(login = %login_name, "account created");
				self.follow_up(Command::SignIn {
					username: login_name,
					password,
				})
			}
			RequestKind::ChannelDirectory => {
				let Some(payload) = self.decode::<ChannelDirectoryPayload>(&kind, &response) else {
					return Vec::new();
				};
				self.state.channels.load(payload.channels.iter().map(|c| c.to_summary()));
				self.sink.on_list_changed(ListKind::Channels);
				Vec::new()
			}
			RequestKind::ChannelLookup => {
				let Some(payload) = self.decode::<ChannelLookupPayload>(&kind, &response) else {
					return Vec::new();
				};
				self.follow_up(Command::JoinChannel { channel: payload.id })
			}
			RequestKind::Join(channel) => {
				let Some(payload) = self.decode::<JoinPayload>(&kind, &response) else {
					return Vec::new();
				};
				self.on_joined(channel, payload)
			}
			RequestKind::Leave(channel) => {
				if let Some(message) = response.message() {
					self.notice(message, NoticeTone::Warning);
				}
				if self.state.session.is_current_channel(channel) {
					self.clear_channel(true)
				} else {
					Vec::new()
				}
			}
			RequestKind::MemberList(channel) => {
				if !self.is_current(channel, &kind) {
					return Vec::new();
				}
				if let Some(payload) = self.decode::<MemberListPayload>(&kind, &response) {
					self.state.members.load(payload.users);
					self.sink.on_list_changed(ListKind::Members);
				}
				Vec::new()
			}
			RequestKind::Permissions { channel, open_list } => {
				if !self.is_current(channel, &kind) {
					return Vec::new();
				}
				if let Some(payload) = self.decode::<PermissionsPayload>(&kind, &response) {
					let entries = payload.permissions.into_vec();
					self.state.session.replace_permissions(entries.iter().cloned());
					self.state.refresh_gated(&mut self.sink);
					if open_list {
						self.state.permissions.load(entries);
						self.sink.on_list_changed(ListKind::Permissions);
					}
				}
				Vec::new()
			}
			RequestKind::Groups { channel, open_list } => {
				if !self.is_current(channel, &kind) {
					return Vec::new();
				}
				if let Some(payload) = self.decode::<GroupsPayload>(&kind, &response) {
					let entries = payload.groups.into_vec();
					self.state.session.replace_groups(entries.iter().cloned());
					if open_list {
						self.state.groups.load(entries);
						self.sink.on_list_changed(ListKind::Groups);
					}
				}
				Vec::new()
			}
			RequestKind::RankList(channel) => {
				if !self.is_current(channel, &kind) {
					return Vec::new();
				}
				if let Some(payload) = self.decode::<RankListPayload>(&kind, &response) {
					self.state.ranks.load(payload.ranks);
					self.sink.on_list_changed(ListKind::Ranks);
				}
				Vec::new()
			}
			RequestKind::BanList(channel) => {
				if !self.is_current(channel, &kind) {
					return Vec::new();
				}
				if let Some(payload) = self.decode::<BanListPayload>(&kind, &response) {
					self.state.bans.load(payload.bans);
					self.sink.on_list_changed(ListKind::Bans);
				}
				Vec::new()
			}
		}
	}

	fn on_poll(&mut self, channel: ChannelId, response: &Response) -> Vec<ClientAction> {
		let mut actions = Vec::new();
		let outcome = match response.status() {
			ResponseStatus::NoContent => PollOutcome::Empty,
			ResponseStatus::Ok | ResponseStatus::Accepted => match response.decode::<EventBatchPayload>() {
				Ok(batch) => {
					let report = apply_batch(&mut self.state, &mut self.sink, channel, &batch.messages);
					debug!(
						%channel,
						applied = report.applied,
						skipped = report.skipped,
						"poll batch applied"
					);
					if report.removed {
						let halted = self.poll.halt();
						actions = self.poll_actions(halted);
					}
					PollOutcome::Events(batch.messages.len())
				}
				Err(e) => {
					warn!(%channel, error = %e, "unreadable poll batch");
					self.sink.on_error(RequestKind::Poll(channel).context(), &e.to_string());
					PollOutcome::Failed
				}
			},
			ResponseStatus::Failed(status) => {
				warn!(%channel, status, "poll rejected; polling stopped");
				self.sink
					.on_error(RequestKind::Poll(channel).context(), &response.error_message());
				PollOutcome::Failed
			}
		};
		actions.extend(self.finish_poll(channel, outcome));
		actions
	}

	/// A failed drain poll for a channel we already left must not stop the current loop.
	fn finish_poll(&mut self, channel: ChannelId, outcome: PollOutcome) -> Vec<ClientAction> {
		let outcome = match outcome {
			PollOutcome::Failed if self.poll.channel().is_some_and(|c| c != channel) => PollOutcome::Empty,
			other => other,
		};
		let next = self.poll.on_batch(outcome);
		self.poll_actions(next)
	}

	fn on_signed_in(&mut self, kind: &RequestKind, response: &Response) -> Vec<ClientAction> {
		let Some(payload) = self.decode::<LoginPayload>(kind, response) else {
			return Vec::new();
		};
		info!(user_id = %payload.user_id, username = %payload.username, "signed in");
		// A new identity must not inherit the previous one's channel or poll loop.
		let mut actions = if self.state.session.channel_id().is_some() {
			self.clear_channel(false)
		} else {
			Vec::new()
		};
		let auto_join = payload.auto_join();
		self.state
			.session
			.sign_in(payload.session, payload.user_id, payload.username.clone());
		self.sink.on_session_changed(&SessionEvent::SignedIn {
			user_id: payload.user_id,
			username: payload.username,
		});
		if let Some(channel) = auto_join {
			actions.extend(self.follow_up(Command::JoinChannel { channel }));
		}
		actions
	}

	/// Submit a command triggered by a response rather than by the operator.
	fn follow_up(&mut self, command: Command) -> Vec<ClientAction> {
		let name = command.name();
		match self.submit(command) {
			Ok(actions) => actions,
			Err(e) => {
				self.sink.on_error(name, &e.to_string());
				Vec::new()
			}
		}
	}

	fn on_joined(&mut self, channel: ChannelId, payload: JoinPayload) -> Vec<ClientAction> {
		let mut actions = Vec::new();
		if let Some(previous) = self.state.session.channel_id()
			&& previous != channel
		{
			info!(%previous, "switching channels");
			actions.extend(self.clear_channel(true));
		}

		info!(%channel, rank = %payload.rank, name = %payload.details.name, "joined channel");
		self.state
			.enter_channel(&mut self.sink, channel, payload.rank, payload.details);

		let started = self.poll.start(channel);
		actions.extend(self.poll_actions(started));

		if let Ok((kind, request)) = list_request(&self.state.session, ListKind::Members) {
			actions.push(ClientAction::Send { kind, request });
		}
		if let Ok(token) = self.state.session.token() {
			actions.push(ClientAction::Send {
				kind: RequestKind::Permissions {
					channel,
					open_list: false,
				},
				request: Request::with_session(Endpoint::Permissions(channel), token),
			});
			actions.push(ClientAction::Send {
				kind: RequestKind::Groups {
					channel,
					open_list: false,
				},
				request: Request::with_session(Endpoint::Groups(channel), token),
			});
		}
		actions
	}

	/// Drop channel state. `drain` issues the final best-effort poll.
	fn clear_channel(&mut self, drain: bool) -> Vec<ClientAction> {
		let poll = if drain { self.poll.stop() } else { self.poll.halt() };
		let actions = self.poll_actions(poll);
		if let Some(channel) = self.state.clear_channel(&mut self.sink) {
			info!(%channel, "left channel");
		}
		actions
	}

	fn poll_now(&mut self, channel: ChannelId) -> Vec<ClientAction> {
		if !self.state.session.is_current_channel(channel) {
			return Vec::new();
		}
		let actions = self.poll.request_now();
		self.poll_actions(actions)
	}

	fn poll_actions(&mut self, actions: Vec<PollAction>) -> Vec<ClientAction> {
		let mut out = Vec::with_capacity(actions.len());
		for action in actions {
			match action {
				PollAction::Fetch { channel } => match self.state.session.token() {
					Ok(token) => out.push(ClientAction::Send {
						kind: RequestKind::Poll(channel),
						request: Request::with_session(Endpoint::Messages(channel), token),
					}),
					Err(_) => {
						debug!(%channel, "poll dropped: no session");
						self.poll.on_batch(PollOutcome::Failed);
					}
				},
				PollAction::Schedule(delay) => out.push(ClientAction::ScheduleTimer(delay)),
				PollAction::CancelTimer => out.push(ClientAction::CancelTimer),
			}
		}
		out
	}

	fn is_current(&self, channel: ChannelId, kind: &RequestKind) -> bool {
		let current = self.state.session.is_current_channel(channel);
		if !current {
			debug!(%channel, request = kind.context(), "discarding response for a channel we left");
		}
		current
	}

	fn decode<T: DeserializeOwned>(&mut self, kind: &RequestKind, response: &Response) -> Option<T> {
		match response.decode::<T>() {
			Ok(payload) => Some(payload),
			Err(e) => {
				warn!(request = kind.context(), error = %e, "unexpected response payload");
				self.sink.on_error(kind.context(), &e.to_string());
				None
			}
		}
	}

	fn report_failure(&mut self, kind: &RequestKind, response: &Response) {
		let message = response.error_message();
		warn!(request = kind.context(), status = response.status, %message, "request rejected");
		self.sink.on_error(kind.context(), &message);
	}

	fn notice(&mut self, text: &str, tone: NoticeTone) {
		self.state.append(
			&mut self.sink,
			LogEntry::Notice {
				text: text.to_string(),
				tone,
			},
		);
	}
}

impl RequestKind {
	/// Short operation name used as the error-sink context.
	pub const fn context(&self) -> &'static str {
		match self {
			Self::SignIn => "sign in",
			Self::SignOut => "sign out",
			Self::CreateAccount { .. } => "create account",
			Self::ChannelDirectory => "list channels",
			Self::ChannelLookup => "find channel",
			Self::Join(_) => "join channel",
			Self::Leave(_) => "leave channel",
			Self::Poll(_) => "message poll",
			Self::MemberList(_) => "member list",
			Self::Permissions { .. } => "permissions",
			Self::Groups { .. } => "groups",
			Self::RankList(_) => "rank list",
			Self::BanList(_) => "ban list",
			Self::SendMessage(_) => "send message",
			Self::Moderation { .. } => "channel command",
		}
	}
}
