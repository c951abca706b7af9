use std::collections::BTreeMap;

use parlor_domain::{
	BanEntry, ChannelDetails, ChannelId, ChannelSummary, GroupEntry, MemberEntry, PermissionEntry, Rank, SessionToken,
	UserId,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Classification of a response status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
	/// 200, data attached.
	Ok,
	/// 202, request accepted (channel reset).
	Accepted,
	/// 204, nothing to report.
	NoContent,
	/// Anything else; the payload carries `message`.
	Failed(u16),
}

impl ResponseStatus {
	pub const fn from_code(code: u16) -> Self {
		match code {
			200 => Self::Ok,
			202 => Self::Accepted,
			204 => Self::NoContent,
			other => Self::Failed(other),
		}
	}

	pub const fn code(self) -> u16 {
		match self {
			Self::Ok => 200,
			Self::Accepted => 202,
			Self::NoContent => 204,
			Self::Failed(code) => code,
		}
	}
}

#[derive(Debug, Error)]
#[error("unexpected payload shape: {0}")]
pub struct PayloadError(#[from] serde_json::Error);

/// A server reply: status code plus the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
	pub status: u16,
	pub payload: Value,
}

impl Response {
	pub fn new(status: u16, payload: Value) -> Self {
		Self { status, payload }
	}

	pub fn status(&self) -> ResponseStatus {
		ResponseStatus::from_code(self.status)
	}

	/// Server-supplied `message` text, if any.
	pub fn message(&self) -> Option<&str> {
		self.payload.get("message").and_then(Value::as_str)
	}

	/// Message for the error sink, falling back to the bare status.
	pub fn error_message(&self) -> String {
		match self.message() {
			Some(m) if !m.is_empty() => m.to_string(),
			_ => format!("request failed with status {}", self.status),
		}
	}

	pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
		Ok(T::deserialize(&self.payload)?)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
	pub session: SessionToken,
	#[serde(rename = "userID", alias = "userId")]
	pub user_id: UserId,
	pub username: String,
	#[serde(default, rename = "defaultChannel")]
	pub default_channel: Option<i64>,
}

impl LoginPayload {
	/// Channel to join straight after sign-in. Ids below 100 are reserved.
	pub fn auto_join(&self) -> Option<ChannelId> {
		self.default_channel
			.filter(|c| *c >= 100)
			.and_then(|c| u32::try_from(c).ok())
			.map(ChannelId)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
	pub rank: Rank,
	#[serde(default)]
	pub details: ChannelDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberListPayload {
	#[serde(default)]
	pub users: Vec<MemberEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankListPayload {
	#[serde(default)]
	pub ranks: Vec<MemberEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BanListPayload {
	#[serde(default)]
	pub bans: Vec<BanEntry>,
}

/// Some listings arrive as an array, others as an object keyed by name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListOrMap<T> {
	List(Vec<T>),
	Map(BTreeMap<String, T>),
}

impl<T> ListOrMap<T> {
	pub fn into_vec(self) -> Vec<T> {
		match self {
			Self::List(items) => items,
			Self::Map(items) => items.into_values().collect(),
		}
	}
}

impl<T> Default for ListOrMap<T> {
	fn default() -> Self {
		Self::List(Vec::new())
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionsPayload {
	#[serde(default)]
	pub permissions: ListOrMap<PermissionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupsPayload {
	#[serde(default)]
	pub groups: ListOrMap<GroupEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryChannel {
	pub id: ChannelId,
	#[serde(default, rename = "isLoaded")]
	pub is_loaded: bool,
	#[serde(default)]
	pub details: Option<ChannelDetails>,
	#[serde(default, rename = "keyName")]
	pub key_name: Option<String>,
	#[serde(default, rename = "memberCount")]
	pub member_count: u32,
}

impl DirectoryChannel {
	/// Unloaded channels show their key name and no members.
	pub fn to_summary(&self) -> ChannelSummary {
		let loaded_name = self.details.as_ref().map(|d| d.name.clone()).filter(|_| self.is_loaded);
		let name = loaded_name
			.or_else(|| self.key_name.clone())
			.unwrap_or_else(|| self.id.to_string());
		ChannelSummary {
			id: self.id,
			name,
			member_count: if self.is_loaded { self.member_count } else { 0 },
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelDirectoryPayload {
	#[serde(default)]
	pub channels: Vec<DirectoryChannel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelLookupPayload {
	pub id: ChannelId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventBatchPayload {
	#[serde(default)]
	pub messages: Vec<Value>,
}
