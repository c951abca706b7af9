use core::fmt;

use parlor_domain::ChannelId;

/// Server endpoints, relative to the service base URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
	Login,
	Logout,
	CreateAccount,
	ChannelDirectory,
	ChannelLookup { name: String },
	Join(ChannelId),
	Leave(ChannelId),
	Messages(ChannelId),
	SendMessage(ChannelId),
	MemberList(ChannelId),
	Groups(ChannelId),
	Permissions(ChannelId),
	PermissionChange(ChannelId),
	Kick(ChannelId),
	TempBan(ChannelId),
	Reset(ChannelId),
	Ranks(ChannelId),
	RankAdd(ChannelId),
	RankUpdate(ChannelId),
	RankRemove(ChannelId),
	Bans(ChannelId),
	BanAdd(ChannelId),
	BanRemove(ChannelId),
}

impl Endpoint {
	/// Relative request path, always with a trailing slash (before any query).
	pub fn path(&self) -> String {
		match self {
			Endpoint::Login => "user/login/standard/".to_string(),
			Endpoint::Logout => "user/logout/".to_string(),
			Endpoint::CreateAccount => "user/create/standard/".to_string(),
			Endpoint::ChannelDirectory => "search/channel/?all".to_string(),
			Endpoint::ChannelLookup { name } => format!("search/channel/?name={}", urlencoding::encode(name)),
			Endpoint::Join(c) => format!("channel/{c}/join/"),
			Endpoint::Leave(c) => format!("channel/{c}/leave/"),
			Endpoint::Messages(c) => format!("channel/{c}/messages/get/"),
			Endpoint::SendMessage(c) => format!("channel/{c}/messages/send/"),
			Endpoint::MemberList(c) => format!("channel/{c}/userlist/"),
			Endpoint::Groups(c) => format!("channel/{c}/groups/"),
			Endpoint::Permissions(c) => format!("channel/{c}/permissions/"),
			Endpoint::PermissionChange(c) => format!("channel/{c}/permissions/change/"),
			Endpoint::Kick(c) => format!("channel/{c}/kick/"),
			Endpoint::TempBan(c) => format!("channel/{c}/tempban/"),
			Endpoint::Reset(c) => format!("channel/{c}/reset/"),
			Endpoint::Ranks(c) => format!("channel/{c}/ranks/"),
			Endpoint::RankAdd(c) => format!("channel/{c}/ranks/add/"),
			Endpoint::RankUpdate(c) => format!("channel/{c}/ranks/update/"),
			Endpoint::RankRemove(c) => format!("channel/{c}/ranks/remove/"),
			Endpoint::Bans(c) => format!("channel/{c}/bans/"),
			Endpoint::BanAdd(c) => format!("channel/{c}/bans/add/"),
			Endpoint::BanRemove(c) => format!("channel/{c}/bans/remove/"),
		}
	}

	/// Channel the endpoint is scoped to, if any.
	pub fn channel(&self) -> Option<ChannelId> {
		match self {
			Endpoint::Login
			| Endpoint::Logout
			| Endpoint::CreateAccount
			| Endpoint::ChannelDirectory
			| Endpoint::ChannelLookup { .. } => None,
			Endpoint::Join(c)
			| Endpoint::Leave(c)
			| Endpoint::Messages(c)
			| Endpoint::SendMessage(c)
			| Endpoint::MemberList(c)
			| Endpoint::Groups(c)
			| Endpoint::Permissions(c)
			| Endpoint::PermissionChange(c)
			| Endpoint::Kick(c)
			| Endpoint::TempBan(c)
			| Endpoint::Reset(c)
			| Endpoint::Ranks(c)
			| Endpoint::RankAdd(c)
			| Endpoint::RankUpdate(c)
			| Endpoint::RankRemove(c)
			| Endpoint::Bans(c)
			| Endpoint::BanAdd(c)
			| Endpoint::BanRemove(c) => Some(*c),
		}
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.path())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn channel_paths() {
		let c = ChannelId(101);
		assert_eq!(Endpoint::Join(c).path(), "channel/101/join/");
		assert_eq!(Endpoint::Messages(c).path(), "channel/101/messages/get/");
		assert_eq!(Endpoint::RankUpdate(c).path(), "channel/101/ranks/update/");
		assert_eq!(Endpoint::Reset(c).channel(), Some(c));
		assert_eq!(Endpoint::Login.channel(), None);
	}

	#[test]
	fn lookup_name_is_query_encoded() {
		let e = Endpoint::ChannelLookup {
			name: "Test Channel&x".to_string(),
		};
		assert_eq!(e.path(), "search/channel/?name=Test%20Channel%26x");
	}
}
