#![forbid(unsafe_code)]

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors for parsing identifiers from strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseIdError {
	#[error("empty value")]
	Empty,
	#[error("invalid format: {0}")]
	InvalidFormat(String),
}

/// Rejected user input. Raised before anything reaches the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
	#[error("ban duration must be a number of minutes, got {0:?}")]
	BanDurationNotNumeric(String),
	#[error("ban duration must be between {min} and {max} minutes, got {got}", min = BanDuration::MIN, max = BanDuration::MAX)]
	BanDurationOutOfRange { got: i64 },
	#[error("{0} must be non-empty")]
	Empty(&'static str),
}

macro_rules! numeric_id {
	($(#[$meta:meta])* $name:ident($inner:ty)) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(pub $inner);

		impl $name {
			pub const fn get(self) -> $inner {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = ParseIdError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				let s = s.trim();
				if s.is_empty() {
					return Err(ParseIdError::Empty);
				}
				s.parse::<$inner>()
					.map(Self)
					.map_err(|_| ParseIdError::InvalidFormat(format!("expected a number, got {s}")))
			}
		}
	};
}

numeric_id!(
	/// Server channel identifier.
	ChannelId(u32)
);

numeric_id!(
	/// Account identifier.
	UserId(u32)
);

numeric_id!(
	/// Channel permission identifier.
	PermissionId(u32)
);

numeric_id!(
	/// Rank tier. Group ids share this space: a member of group `n` holds rank `n`.
	Rank(i32)
);

impl Rank {
	/// Group 0, the tier of members without an explicit rank.
	pub const UNRANKED: Rank = Rank(0);
}

/// Opaque session token issued at sign-in.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
	pub fn new(token: impl Into<String>) -> Result<Self, ParseIdError> {
		let token = token.into();
		if token.trim().is_empty() {
			return Err(ParseIdError::Empty);
		}
		Ok(Self(token))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for SessionToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SessionToken(***)")
	}
}

/// Java-style ARGB colour as sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Colour(pub u32);

impl Colour {
	pub const BLACK: Colour = Colour(0xFF00_0000);

	pub const fn alpha(self) -> u8 {
		(self.0 >> 24) as u8
	}

	pub const fn red(self) -> u8 {
		(self.0 >> 16) as u8
	}

	pub const fn green(self) -> u8 {
		(self.0 >> 8) as u8
	}

	pub const fn blue(self) -> u8 {
		self.0 as u8
	}

	/// Parse `#rrggbb` (opaque) or `#aarrggbb`.
	pub fn parse_hex(s: &str) -> Result<Self, ParseIdError> {
		let s = s.trim();
		if s.is_empty() {
			return Err(ParseIdError::Empty);
		}
		let digits = s.strip_prefix('#').unwrap_or(s);
		let value = u32::from_str_radix(digits, 16)
			.map_err(|_| ParseIdError::InvalidFormat(format!("invalid colour: {s}")))?;
		match digits.len() {
			6 => Ok(Self(0xFF00_0000 | value)),
			8 => Ok(Self(value)),
			_ => Err(ParseIdError::InvalidFormat(format!("invalid colour: {s}"))),
		}
	}

	/// CSS `rgba(r,g,b,a)` form with alpha in `[0, 1]`.
	pub fn to_css(self) -> String {
		let alpha = f64::from(self.alpha()) / 255.0;
		format!("rgba({},{},{},{})", self.red(), self.green(), self.blue(), alpha)
	}
}

impl Default for Colour {
	fn default() -> Self {
		Self::BLACK
	}
}

impl<'de> Deserialize<'de> for Colour {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Repr {
			Int(i64),
			Text(String),
		}

		match Repr::deserialize(deserializer)? {
			// Java's getRGB() is signed; keep the low 32 bits.
			Repr::Int(v) => Ok(Colour(v as u32)),
			Repr::Text(s) => Colour::parse_hex(&s).map_err(serde::de::Error::custom),
		}
	}
}

/// Group reference carried on member, rank and chat entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
	#[serde(rename = "id")]
	pub rank: Rank,
	#[serde(default)]
	pub name: String,
	#[serde(default, alias = "iconUrl")]
	pub icon: Option<String>,
}

impl GroupRef {
	pub fn new(rank: Rank, name: impl Into<String>) -> Self {
		Self {
			rank,
			name: name.into(),
			icon: None,
		}
	}
}

/// Row of the member list. The rank list uses the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEntry {
	#[serde(rename = "userID", alias = "userId")]
	pub user_id: UserId,
	pub username: String,
	pub group: GroupRef,
}

pub type RankEntry = MemberEntry;

/// Row of the ban list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanEntry {
	#[serde(rename = "userID", alias = "userId")]
	pub user_id: UserId,
	#[serde(default)]
	pub username: String,
}

/// A channel permission and the minimum rank it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
	#[serde(rename = "permissionID")]
	pub id: PermissionId,
	pub name: String,
	pub value: Rank,
	#[serde(default, rename = "minValue")]
	pub min_value: Option<Rank>,
	#[serde(default, rename = "maxValue")]
	pub max_value: Option<Rank>,
}

/// Group definition for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
	pub id: Rank,
	pub name: String,
	#[serde(default, alias = "iconUrl")]
	pub icon: Option<String>,
	#[serde(default, rename = "type")]
	pub group_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOwner {
	pub id: UserId,
	#[serde(default)]
	pub name: Option<String>,
}

/// Channel details returned on join and on detail updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDetails {
	#[serde(default)]
	pub name: String,
	#[serde(default, rename = "openingMessage")]
	pub opening_message: Option<String>,
	#[serde(default, rename = "messageColour")]
	pub message_colour: Option<Colour>,
	#[serde(default)]
	pub owner: Option<ChannelOwner>,
}

/// Entry of the server channel directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
	pub id: ChannelId,
	pub name: String,
	pub member_count: u32,
}

/// Who a moderation command applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserTarget {
	Id(UserId),
	Name(String),
}

impl From<UserId> for UserTarget {
	fn from(id: UserId) -> Self {
		UserTarget::Id(id)
	}
}

impl From<&str> for UserTarget {
	fn from(name: &str) -> Self {
		UserTarget::Name(name.to_string())
	}
}

impl From<String> for UserTarget {
	fn from(name: String) -> Self {
		UserTarget::Name(name)
	}
}

impl fmt::Display for UserTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			UserTarget::Id(id) => write!(f, "#{id}"),
			UserTarget::Name(name) => f.write_str(name),
		}
	}
}

/// Temporary ban length in minutes, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BanDuration(u16);

impl BanDuration {
	pub const MIN: u16 = 1;
	pub const MAX: u16 = 360;

	pub fn from_minutes(minutes: i64) -> Result<Self, InputError> {
		if minutes < i64::from(Self::MIN) || minutes > i64::from(Self::MAX) {
			return Err(InputError::BanDurationOutOfRange { got: minutes });
		}
		Ok(Self(minutes as u16))
	}

	pub const fn minutes(self) -> u16 {
		self.0
	}
}

impl FromStr for BanDuration {
	type Err = InputError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		let minutes: i64 = trimmed
			.parse()
			.map_err(|_| InputError::BanDurationNotNumeric(trimmed.to_string()))?;
		Self::from_minutes(minutes)
	}
}
