use parlor_domain::{BanEntry, ChannelDetails, ChannelId, ChannelSummary, GroupEntry, MemberEntry, PermissionEntry, Rank, RankEntry, UserId};

use crate::log::{LogEntry, MessageLog};
use crate::permissions::GatedActions;
use crate::session::SessionContext;
use crate::sink::{ClientSink, ListKind, SessionEvent};
use crate::store::{ClosedPolicy, ProjectionStore};

/// Everything the client knows, owned by one engine.
#[derive(Debug, Clone)]
pub struct ClientState {
	pub session: SessionContext,
	pub log: MessageLog,
	pub members: ProjectionStore<MemberEntry>,
	pub ranks: ProjectionStore<RankEntry>,
	pub bans: ProjectionStore<BanEntry>,
	pub permissions: ProjectionStore<PermissionEntry>,
	pub groups: ProjectionStore<GroupEntry>,
	pub channels: ProjectionStore<ChannelSummary>,
	gated: GatedActions,
}

impl ClientState {
	pub fn new(log_capacity: usize) -> Self {
		Self {
			session: SessionContext::new(),
			log: MessageLog::with_capacity(log_capacity),
			members: ProjectionStore::new(ClosedPolicy::Apply),
			ranks: ProjectionStore::new(ClosedPolicy::Drop),
			bans: ProjectionStore::new(ClosedPolicy::Drop),
			permissions: ProjectionStore::new(ClosedPolicy::Drop),
			groups: ProjectionStore::new(ClosedPolicy::Drop),
			channels: ProjectionStore::new(ClosedPolicy::Drop),
			gated: GatedActions::default(),
		}
	}

	pub fn gated(&self) -> GatedActions {
		self.gated
	}

	/// Re-derive gated actions; the sink hears about it only on change.
	pub fn refresh_gated(&mut self, sink: &mut impl ClientSink) -> bool {
		let next = GatedActions::derive(&self.session);
		if next == self.gated {
			return false;
		}
		self.gated = next;
		sink.on_gated_actions_changed(next);
		true
	}

	pub fn append(&mut self, sink: &mut impl ClientSink, entry: LogEntry) {
		let entry = self.log.push(entry);
		sink.on_message_appended(entry);
	}

	pub fn is_attached(&self, kind: ListKind) -> bool {
		match kind {
			ListKind::Members => self.members.is_attached(),
			ListKind::Ranks => self.ranks.is_attached(),
			ListKind::Bans => self.bans.is_attached(),
			ListKind::Permissions => self.permissions.is_attached(),
			ListKind::Groups => self.groups.is_attached(),
			ListKind::Channels => self.channels.is_attached(),
		}
	}

	/// Clear and detach one list.
	pub fn close_list(&mut self, sink: &mut impl ClientSink, kind: ListKind) {
		let was_visible = self.is_attached(kind);
		match kind {
			ListKind::Members => self.members.close(),
			ListKind::Ranks => self.ranks.close(),
			ListKind::Bans => self.bans.close(),
			ListKind::Permissions => self.permissions.close(),
			ListKind::Groups => self.groups.close(),
			ListKind::Channels => self.channels.close(),
		}
		if was_visible {
			sink.on_list_changed(kind);
		}
	}

	/// Leave the current channel locally: session channel fields and every
	/// channel-scoped list are reset. Returns the channel that was left.
	pub fn clear_channel(&mut self, sink: &mut impl ClientSink) -> Option<ChannelId> {
		let channel = self.session.channel_id();
		self.session.leave_channel();
		for kind in [
			ListKind::Members,
			ListKind::Ranks,
			ListKind::Bans,
			ListKind::Permissions,
			ListKind::Groups,
		] {
			self.close_list(sink, kind);
		}
		self.refresh_gated(sink);
		if let Some(channel) = channel {
			sink.on_session_changed(&SessionEvent::ChannelLeft { channel });
		}
		channel
	}

	pub fn enter_channel(&mut self, sink: &mut impl ClientSink, channel: ChannelId, rank: Rank, details: ChannelDetails) {
		self.session.enter_channel(channel, rank, details.clone());
		self.members.clear();
		self.refresh_gated(sink);
		sink.on_session_changed(&SessionEvent::ChannelJoined { channel, rank, details });
	}

	pub fn sign_out(&mut self, sink: &mut impl ClientSink) {
		self.clear_channel(sink);
		self.close_list(sink, ListKind::Channels);
		self.session.sign_out();
		sink.on_session_changed(&SessionEvent::SignedOut);
	}

	pub fn snapshot(&self) -> ClientSnapshot {
		ClientSnapshot {
			user_id: self.session.user_id(),
			username: self.session.username().map(str::to_string),
			channel_id: self.session.channel_id(),
			channel_details: self.session.channel_details().cloned(),
			user_rank: self.session.user_rank(),
			gated: self.gated,
			log: self.log.iter().cloned().collect(),
			members: self.members.iter().cloned().collect(),
			ranks: self.ranks.iter().cloned().collect(),
			bans: self.bans.iter().cloned().collect(),
			permissions: self.permissions.iter().cloned().collect(),
			groups: self.groups.iter().cloned().collect(),
			channels: self.channels.iter().cloned().collect(),
		}
	}
}

/// Owned copy of the state, for readers on other tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSnapshot {
	pub user_id: Option<UserId>,
	pub username: Option<String>,
	pub channel_id: Option<ChannelId>,
	pub channel_details: Option<ChannelDetails>,
	pub user_rank: Option<Rank>,
	pub gated: GatedActions,
	pub log: Vec<LogEntry>,
	pub members: Vec<MemberEntry>,
	pub ranks: Vec<RankEntry>,
	pub bans: Vec<BanEntry>,
	pub permissions: Vec<PermissionEntry>,
	pub groups: Vec<GroupEntry>,
	pub channels: Vec<ChannelSummary>,
}
