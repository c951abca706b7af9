use parlor_domain::{ChannelDetails, ChannelId, Rank, UserId};
use tokio::sync::mpsc;

use crate::log::LogEntry;
use crate::permissions::GatedActions;

/// Which projection a list notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
	Members,
	Ranks,
	Bans,
	Permissions,
	Groups,
	Channels,
}

impl ListKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Members => "members",
			Self::Ranks => "ranks",
			Self::Bans => "bans",
			Self::Permissions => "permissions",
			Self::Groups => "groups",
			Self::Channels => "channels",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	SignedIn { user_id: UserId, username: String },
	SignedOut,
	ChannelJoined { channel: ChannelId, rank: Rank, details: ChannelDetails },
	ChannelLeft { channel: ChannelId },
	RankChanged { rank: Rank },
	DetailsChanged(ChannelDetails),
}

/// Presentation callbacks. The core never reads anything back through it.
pub trait ClientSink {
	fn on_message_appended(&mut self, _entry: &LogEntry) {}

	fn on_list_changed(&mut self, _kind: ListKind) {}

	fn on_gated_actions_changed(&mut self, _actions: GatedActions) {}

	fn on_session_changed(&mut self, _event: &SessionEvent) {}

	/// User-visible failure. `context` names the operation or endpoint.
	fn on_error(&mut self, context: &str, message: &str);

	/// Protocol problems worth logging but not showing.
	fn on_diagnostic(&mut self, _message: &str) {}
}

/// Owned form of every sink callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
	MessageAppended(LogEntry),
	ListChanged(ListKind),
	GatedActionsChanged(GatedActions),
	Session(SessionEvent),
	Error { context: String, message: String },
	Diagnostic(String),
}

/// Forwards callbacks to another task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
	tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelSink {
	pub fn new(tx: mpsc::UnboundedSender<UiEvent>) -> Self {
		Self { tx }
	}

	fn send(&self, event: UiEvent) {
		// A dropped receiver means nobody is rendering anymore.
		let _ = self.tx.send(event);
	}
}

impl ClientSink for ChannelSink {
	fn on_message_appended(&mut self, entry: &LogEntry) {
		self.send(UiEvent::MessageAppended(entry.clone()));
	}

	fn on_list_changed(&mut self, kind: ListKind) {
		self.send(UiEvent::ListChanged(kind));
	}

	fn on_gated_actions_changed(&mut self, actions: GatedActions) {
		self.send(UiEvent::GatedActionsChanged(actions));
	}

	fn on_session_changed(&mut self, event: &SessionEvent) {
		self.send(UiEvent::Session(event.clone()));
	}

	fn on_error(&mut self, context: &str, message: &str) {
		self.send(UiEvent::Error {
			context: context.to_string(),
			message: message.to_string(),
		});
	}

	fn on_diagnostic(&mut self, message: &str) {
		self.send(UiEvent::Diagnostic(message.to_string()));
	}
}

/// Keeps every callback in order. Used by tests and headless tools.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
	pub events: Vec<UiEvent>,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
		self.events.iter().filter_map(|e| match e {
			UiEvent::Error { context, message } => Some((context.as_str(), message.as_str())),
			_ => None,
		})
	}

	pub fn diagnostics(&self) -> impl Iterator<Item = &str> {
		self.events.iter().filter_map(|e| match e {
			UiEvent::Diagnostic(m) => Some(m.as_str()),
			_ => None,
		})
	}

	pub fn messages(&self) -> impl Iterator<Item = &LogEntry> {
		self.events.iter().filter_map(|e| match e {
			UiEvent::MessageAppended(entry) => Some(entry),
			_ => None,
		})
	}

	pub fn clear(&mut self) {
		self.events.clear();
	}
}

impl ClientSink for RecordingSink {
	fn on_message_appended(&mut self, entry: &LogEntry) {
		self.events.push(UiEvent::MessageAppended(entry.clone()));
	}

	fn on_list_changed(&mut self, kind: ListKind) {
		self.events.push(UiEvent::ListChanged(kind));
	}

	fn on_gated_actions_changed(&mut self, actions: GatedActions) {
		self.events.push(UiEvent::GatedActionsChanged(actions));
	}

	fn on_session_changed(&mut self, event: &SessionEvent) {
		self.events.push(UiEvent::Session(event.clone()));
	}

	fn on_error(&mut self, context: &str, message: &str) {
		self.events.push(UiEvent::Error {
			context: context.to_string(),
			message: message.to_string(),
		});
	}

	fn on_diagnostic(&mut self, message: &str) {
		self.events.push(UiEvent::Diagnostic(message.to_string()));
	}
}
