use std::collections::BTreeMap;

use parlor_domain::{ChannelDetails, ChannelId, GroupEntry, PermissionEntry, Rank, SessionToken, UserId};

use crate::error::ClientCoreError;

/// Identity and per-channel reference data for one signed-in user.
///
/// Channel fields are all set together on join and all cleared together on
/// leave, so nothing cached here can outlive the channel it came from.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
	session_token: Option<SessionToken>,
	user_id: Option<UserId>,
	username: Option<String>,
	channel_id: Option<ChannelId>,
	channel_details: Option<ChannelDetails>,
	user_rank: Option<Rank>,
	/// Keyed by lowercased permission name.
	permissions: BTreeMap<String, PermissionEntry>,
	groups: BTreeMap<Rank, GroupEntry>,
}

impl SessionContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn sign_in(&mut self, token: SessionToken, user_id: UserId, username: impl Into<String>) {
		*self = Self {
			session_token: Some(token),
			user_id: Some(user_id),
			username: Some(username.into()),
			..Self::default()
		};
	}

	/// Back to the anonymous state.
	pub fn sign_out(&mut self) {
		*self = Self::default();
	}

	pub fn is_signed_in(&self) -> bool {
		self.session_token.is_some()
	}

	pub fn token(&self) -> Result<&SessionToken, ClientCoreError> {
		self.session_token.as_ref().ok_or(ClientCoreError::NotSignedIn)
	}

	/// Token and current channel, for channel-scoped commands.
	pub fn channel_scope(&self) -> Result<(&SessionToken, ChannelId), ClientCoreError> {
		let token = self.token()?;
		let channel = self.channel_id.ok_or(ClientCoreError::NotInChannel)?;
		Ok((token, channel))
	}

	pub fn user_id(&self) -> Option<UserId> {
		self.user_id
	}

	pub fn username(&self) -> Option<&str> {
		self.username.as_deref()
	}

	pub fn channel_id(&self) -> Option<ChannelId> {
		self.channel_id
	}

	pub fn channel_details(&self) -> Option<&ChannelDetails> {
		self.channel_details.as_ref()
	}

	pub fn user_rank(&self) -> Option<Rank> {
		self.user_rank
	}

	pub fn is_current_channel(&self, channel: ChannelId) -> bool {
		self.channel_id == Some(channel)
	}

	/// Enter a channel. Reference data from any previous channel is discarded.
	pub fn enter_channel(&mut self, channel: ChannelId, rank: Rank, details: ChannelDetails) {
		self.channel_id = Some(channel);
		self.user_rank = Some(rank);
		self.channel_details = Some(details);
		self.permissions.clear();
		self.groups.clear();
	}

	pub fn leave_channel(&mut self) {
		self.channel_id = None;
		self.channel_details = None;
		self.user_rank = None;
		self.permissions.clear();
		self.groups.clear();
	}

	pub fn set_user_rank(&mut self, rank: Rank) {
		self.user_rank = Some(rank);
	}

	pub fn set_channel_details(&mut self, details: ChannelDetails) {
		if self.channel_id.is_some() {
			self.channel_details = Some(details);
		}
	}

	pub fn permission(&self, name: &str) -> Option<&PermissionEntry> {
		self.permissions.get(&name.to_lowercase())
	}

	pub fn permissions(&self) -> impl Iterator<Item = &PermissionEntry> {
		self.permissions.values()
	}

	pub fn replace_permissions(&mut self, entries: impl IntoIterator<Item = PermissionEntry>) {
		self.permissions = entries.into_iter().map(|p| (p.name.to_lowercase(), p)).collect();
	}

	pub fn upsert_permission(&mut self, entry: PermissionEntry) {
		self.permissions.insert(entry.name.to_lowercase(), entry);
	}

	pub fn group(&self, rank: Rank) -> Option<&GroupEntry> {
		self.groups.get(&rank)
	}

	pub fn groups(&self) -> impl Iterator<Item = &GroupEntry> {
		self.groups.values()
	}

	pub fn replace_groups(&mut self, entries: impl IntoIterator<Item = GroupEntry>) {
		self.groups = entries.into_iter().map(|g| (g.id, g)).collect();
	}

	/// Returns false when no group with that rank is cached.
	pub fn rename_group(&mut self, rank: Rank, name: &str) -> bool {
		match self.groups.get_mut(&rank) {
			Some(group) => {
				group.name = name.to_string();
				true
			}
			None => false,
		}
	}
}
