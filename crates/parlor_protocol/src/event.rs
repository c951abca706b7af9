use core::fmt;

use parlor_domain::{BanEntry, ChannelDetails, Colour, MemberEntry, PermissionEntry, Rank, UserId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Wire type tags of queued channel events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
	LocalSystemMessage = 3,
	GlobalSystemMessage = 4,
	ChatMessage = 5,
	MemberAdded = 6,
	MemberRemoved = 7,
	MemberUpdated = 8,
	PermissionChanged = 9,
	RemovedFromChannel = 10,
	RankListAdded = 11,
	RankListRemoved = 12,
	RankListUpdated = 13,
	BanListAdded = 14,
	BanListRemoved = 15,
	RankNameChanged = 16,
	ChannelDetailsChanged = 17,
	RankChanged = 18,
}

impl EventKind {
	pub fn from_tag(tag: i64) -> Option<Self> {
		Some(match tag {
			3 => Self::LocalSystemMessage,
			4 => Self::GlobalSystemMessage,
			5 => Self::ChatMessage,
			6 => Self::MemberAdded,
			7 => Self::MemberRemoved,
			8 => Self::MemberUpdated,
			9 => Self::PermissionChanged,
			10 => Self::RemovedFromChannel,
			11 => Self::RankListAdded,
			12 => Self::RankListRemoved,
			13 => Self::RankListUpdated,
			14 => Self::BanListAdded,
			15 => Self::BanListRemoved,
			16 => Self::RankNameChanged,
			17 => Self::ChannelDetailsChanged,
			18 => Self::RankChanged,
			_ => return None,
		})
	}

	pub const fn tag(self) -> u8 {
		self as u8
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::LocalSystemMessage => "local_system_message",
			Self::GlobalSystemMessage => "global_system_message",
			Self::ChatMessage => "chat_message",
			Self::MemberAdded => "member_added",
			Self::MemberRemoved => "member_removed",
			Self::MemberUpdated => "member_updated",
			Self::PermissionChanged => "permission_changed",
			Self::RemovedFromChannel => "removed_from_channel",
			Self::RankListAdded => "rank_list_added",
			Self::RankListRemoved => "rank_list_removed",
			Self::RankListUpdated => "rank_list_updated",
			Self::BanListAdded => "ban_list_added",
			Self::BanListRemoved => "ban_list_removed",
			Self::RankNameChanged => "rank_name_changed",
			Self::ChannelDetailsChanged => "channel_details_changed",
			Self::RankChanged => "rank_changed",
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({})", self.as_str(), self.tag())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemMessage {
	pub message: String,
	#[serde(default, rename = "messageColour")]
	pub colour: Option<Colour>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
	#[serde(default, rename = "senderID", alias = "userID")]
	pub sender_id: Option<UserId>,
	#[serde(rename = "senderName")]
	pub sender_name: String,
	#[serde(default, rename = "senderRank")]
	pub sender_rank: Option<Rank>,
	pub message: String,
}

#[derive(Deserialize)]
struct UserRef {
	#[serde(rename = "userID", alias = "userId")]
	user_id: UserId,
}

#[derive(Deserialize)]
struct RankName {
	#[serde(rename = "rankID", alias = "id")]
	rank: Rank,
	#[serde(rename = "rankName", alias = "name")]
	name: String,
}

#[derive(Deserialize)]
struct RankUpdate {
	#[serde(rename = "userID", alias = "userId")]
	user_id: UserId,
	rank: Rank,
}

/// A decoded channel event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
	LocalSystemMessage(SystemMessage),
	GlobalSystemMessage(SystemMessage),
	ChatMessage(ChatMessage),
	MemberAdded(MemberEntry),
	MemberRemoved { user_id: UserId },
	MemberUpdated(MemberEntry),
	PermissionChanged(PermissionEntry),
	RemovedFromChannel,
	RankListAdded(MemberEntry),
	RankListRemoved { user_id: UserId },
	RankListUpdated(MemberEntry),
	BanListAdded(BanEntry),
	BanListRemoved { user_id: UserId },
	RankNameChanged { rank: Rank, name: String },
	ChannelDetailsChanged(ChannelDetails),
	RankChanged { user_id: UserId, rank: Rank },
}

impl ChannelEvent {
	pub fn kind(&self) -> EventKind {
		match self {
			Self::LocalSystemMessage(_) => EventKind::LocalSystemMessage,
			Self::GlobalSystemMessage(_) => EventKind::GlobalSystemMessage,
			Self::ChatMessage(_) => EventKind::ChatMessage,
			Self::MemberAdded(_) => EventKind::MemberAdded,
			Self::MemberRemoved { .. } => EventKind::MemberRemoved,
			Self::MemberUpdated(_) => EventKind::MemberUpdated,
			Self::PermissionChanged(_) => EventKind::PermissionChanged,
			Self::RemovedFromChannel => EventKind::RemovedFromChannel,
			Self::RankListAdded(_) => EventKind::RankListAdded,
			Self::RankListRemoved { .. } => EventKind::RankListRemoved,
			Self::RankListUpdated(_) => EventKind::RankListUpdated,
			Self::BanListAdded(_) => EventKind::BanListAdded,
			Self::BanListRemoved { .. } => EventKind::BanListRemoved,
			Self::RankNameChanged { .. } => EventKind::RankNameChanged,
			Self::ChannelDetailsChanged(_) => EventKind::ChannelDetailsChanged,
			Self::RankChanged { .. } => EventKind::RankChanged,
		}
	}
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
	#[error("event has no type tag: {raw}")]
	MissingType { raw: String },
	#[error("unhandled event type {tag}: {raw}")]
	UnknownType { tag: String, raw: String },
	#[error("malformed {kind} event: {source}")]
	Malformed {
		kind: EventKind,
		#[source]
		source: serde_json::Error,
	},
}

fn read_tag(value: &Value) -> Option<Result<i64, String>> {
	let tag = value.get("type")?;
	Some(match tag {
		Value::Number(n) => n.as_i64().ok_or_else(|| n.to_string()),
		Value::String(s) => s.trim().parse::<i64>().map_err(|_| s.clone()),
		other => Err(other.to_string()),
	})
}

fn payload<T: DeserializeOwned>(kind: EventKind, value: &Value) -> Result<T, EventDecodeError> {
	T::deserialize(value).map_err(|source| EventDecodeError::Malformed { kind, source })
}

/// Decode one raw event record. The `type` field may be a number or a numeric string.
pub fn decode_event(value: &Value) -> Result<ChannelEvent, EventDecodeError> {
	let tag = match read_tag(value) {
		None => {
			return Err(EventDecodeError::MissingType {
				raw: value.to_string(),
			});
		}
		Some(Err(tag)) => {
			return Err(EventDecodeError::UnknownType {
				tag,
				raw: value.to_string(),
			});
		}
		Some(Ok(tag)) => tag,
	};

	let Some(kind) = EventKind::from_tag(tag) else {
		return Err(EventDecodeError::UnknownType {
			tag: tag.to_string(),
			raw: value.to_string(),
		});
	};

	let event = match kind {
		EventKind::LocalSystemMessage => ChannelEvent::LocalSystemMessage(payload(kind, value)?),
		EventKind::GlobalSystemMessage => ChannelEvent::GlobalSystemMessage(payload(kind, value)?),
		EventKind::ChatMessage => ChannelEvent::ChatMessage(payload(kind, value)?),
		EventKind::MemberAdded => ChannelEvent::MemberAdded(payload(kind, value)?),
		EventKind::MemberRemoved => {
			let r: UserRef = payload(kind, value)?;
			ChannelEvent::MemberRemoved { user_id: r.user_id }
		}
		EventKind::MemberUpdated => ChannelEvent::MemberUpdated(payload(kind, value)?),
		EventKind::PermissionChanged => ChannelEvent::PermissionChanged(payload(kind, value)?),
		EventKind::RemovedFromChannel => ChannelEvent::RemovedFromChannel,
		EventKind::RankListAdded => ChannelEvent::RankListAdded(payload(kind, value)?),
		EventKind::RankListRemoved => {
			let r: UserRef = payload(kind, value)?;
			ChannelEvent::RankListRemoved { user_id: r.user_id }
		}
		EventKind::RankListUpdated => ChannelEvent::RankListUpdated(payload(kind, value)?),
		EventKind::BanListAdded => ChannelEvent::BanListAdded(payload(kind, value)?),
		EventKind::BanListRemoved => {
			let r: UserRef = payload(kind, value)?;
			ChannelEvent::BanListRemoved { user_id: r.user_id }
		}
		EventKind::RankNameChanged => {
			let r: RankName = payload(kind, value)?;
			ChannelEvent::RankNameChanged {
				rank: r.rank,
				name: r.name,
			}
		}
		// Details arrive flat beside `type`, unlike the join reply.
		EventKind::ChannelDetailsChanged => ChannelEvent::ChannelDetailsChanged(payload(kind, value)?),
		EventKind::RankChanged => {
			let r: RankUpdate = payload(kind, value)?;
			ChannelEvent::RankChanged {
				user_id: r.user_id,
				rank: r.rank,
			}
		}
	};
	Ok(event)
}

/// Decode a poll batch, keeping order. Each record decodes independently.
pub fn decode_batch(values: &[Value]) -> Vec<Result<ChannelEvent, EventDecodeError>> {
	values.iter().map(decode_event).collect()
}
