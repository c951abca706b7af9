use core::fmt;

use parlor_domain::{BanDuration, ChannelId, InputError, Rank, UserId, UserTarget};
use parlor_protocol::{Endpoint, Request};

use crate::error::ClientCoreError;
use crate::session::SessionContext;
use crate::sink::ListKind;

/// Password held only long enough to send it.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
	pub fn new(s: impl Into<String>) -> Self {
		Self(s.into())
	}

	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for Password {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Password(<redacted>)")
	}
}

/// Operator-issued operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	SignIn {
		username: String,
		password: Password,
	},
	SignOut,
	CreateAccount {
		login_name: String,
		username: String,
		password: Password,
	},
	ListChannels,
	JoinChannelByName {
		name: String,
	},
	JoinChannel {
		channel: ChannelId,
	},
	LeaveChannel,
	/// Drop channel state locally without telling the server.
	ClearChannel,
	SendMessage {
		text: String,
	},
	Kick {
		target: UserTarget,
	},
	TempBan {
		target: UserTarget,
		duration: BanDuration,
	},
	ResetChannel,
	ChangeRank {
		user: UserId,
		rank: Rank,
	},
	RemoveRank {
		user: UserId,
	},
	AddRank {
		target: UserTarget,
	},
	AddBan {
		target: UserTarget,
	},
	RemoveBan {
		user: UserId,
	},
	ChangePermission {
		name: String,
		value: Rank,
	},
	OpenList(ListKind),
	CloseLists,
	/// Restart polling after it stopped on an error.
	StartPolling,
	StopPolling,
}

impl Command {
	pub fn sign_in(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self::SignIn {
			username: username.into(),
			password: Password::new(password),
		}
	}

	/// Temporary ban from raw operator input. Bad durations never become a command.
	pub fn temp_ban(target: impl Into<UserTarget>, minutes: &str) -> Result<Self, InputError> {
		Ok(Self::TempBan {
			target: target.into(),
			duration: minutes.parse()?,
		})
	}

	pub fn send_message(text: impl Into<String>) -> Result<Self, InputError> {
		let text = text.into();
		if text.trim().is_empty() {
			return Err(InputError::Empty("message"));
		}
		Ok(Self::SendMessage { text })
	}

	pub const fn name(&self) -> &'static str {
		match self {
			Self::SignIn { .. } => "sign in",
			Self::SignOut => "sign out",
			Self::CreateAccount { .. } => "create account",
			Self::ListChannels => "list channels",
			Self::JoinChannelByName { .. } | Self::JoinChannel { .. } => "join channel",
			Self::LeaveChannel => "leave channel",
			Self::ClearChannel => "clear channel",
			Self::SendMessage { .. } => "send message",
			Self::Kick { .. } => "kick",
			Self::TempBan { .. } => "temporary ban",
			Self::ResetChannel => "reset channel",
			Self::ChangeRank { .. } => "change rank",
			Self::RemoveRank { .. } => "remove rank",
			Self::AddRank { .. } => "add rank",
			Self::AddBan { .. } => "add ban",
			Self::RemoveBan { .. } => "remove ban",
			Self::ChangePermission { .. } => "change permission",
			Self::OpenList(_) => "open list",
			Self::CloseLists => "close lists",
			Self::StartPolling => "start polling",
			Self::StopPolling => "stop polling",
		}
	}
}

/// What a pending request was for, so its response can be routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
	SignIn,
	SignOut,
	CreateAccount { login_name: String, password: Password },
	ChannelDirectory,
	ChannelLookup,
	Join(ChannelId),
	Leave(ChannelId),
	Poll(ChannelId),
	MemberList(ChannelId),
	Permissions { channel: ChannelId, open_list: bool },
	Groups { channel: ChannelId, open_list: bool },
	RankList(ChannelId),
	BanList(ChannelId),
	SendMessage(ChannelId),
	/// A state-changing channel command; success logs the confirmation and polls.
	Moderation { channel: ChannelId, expect_accepted: bool },
}

/// Build the request for a networked command. Local-only commands yield `None`.
pub fn build_request(session: &SessionContext, command: &Command) -> Result<Option<(RequestKind, Request)>, ClientCoreError> {
	let built = match command {
		Command::SignIn { username, password } => (RequestKind::SignIn, Request::login(username, password.expose())),
		Command::SignOut => (RequestKind::SignOut, Request::logout(session.token()?)),
		Command::CreateAccount {
			login_name,
			username,
			password,
		} => (
			RequestKind::CreateAccount {
				login_name: login_name.clone(),
				password: password.clone(),
			},
			Request::create_account(login_name, username, password.expose()),
		),
		Command::ListChannels => (
			RequestKind::ChannelDirectory,
			Request::with_session(Endpoint::ChannelDirectory, session.token()?),
		),
		Command::JoinChannelByName { name } => {
			if name.trim().is_empty() {
				return Err(InputError::Empty("channel name").into());
			}
			(
				RequestKind::ChannelLookup,
				Request::with_session(Endpoint::ChannelLookup { name: name.clone() }, session.token()?),
			)
		}
		Command::JoinChannel { channel } => (
			RequestKind::Join(*channel),
			Request::with_session(Endpoint::Join(*channel), session.token()?),
		),
		Command::LeaveChannel => {
			let (token, channel) = session.channel_scope()?;
			(RequestKind::Leave(channel), Request::with_session(Endpoint::Leave(channel), token))
		}
		Command::SendMessage { text } => {
			let (token, channel) = session.channel_scope()?;
			(RequestKind::SendMessage(channel), Request::send_message(channel, token, text))
		}
		Command::Kick { target } => {
			let (token, channel) = session.channel_scope()?;
			(moderation(channel), Request::targeted(Endpoint::Kick(channel), token, target, None))
		}
		Command::TempBan { target, duration } => {
			let (token, channel) = session.channel_scope()?;
			(
				moderation(channel),
				Request::targeted(Endpoint::TempBan(channel), token, target, Some(*duration)),
			)
		}
		Command::ResetChannel => {
			let (token, channel) = session.channel_scope()?;
			(
				RequestKind::Moderation {
					channel,
					expect_accepted: true,
				},
				Request::with_session(Endpoint::Reset(channel), token),
			)
		}
		Command::ChangeRank { user, rank } => {
			let (token, channel) = session.channel_scope()?;
			(moderation(channel), Request::change_rank(channel, token, *user, *rank))
		}
		Command::RemoveRank { user } => {
			let (token, channel) = session.channel_scope()?;
			(
				moderation(channel),
				Request::targeted(Endpoint::RankRemove(channel), token, &UserTarget::Id(*user), None),
			)
		}
		Command::AddRank { target } => {
			let (token, channel) = session.channel_scope()?;
			(moderation(channel), Request::targeted(Endpoint::RankAdd(channel), token, target, None))
		}
		Command::AddBan { target } => {
			let (token, channel) = session.channel_scope()?;
			(moderation(channel), Request::targeted(Endpoint::BanAdd(channel), token, target, None))
		}
		Command::RemoveBan { user } => {
			let (token, channel) = session.channel_scope()?;
			(
				moderation(channel),
				Request::targeted(Endpoint::BanRemove(channel), token, &UserTarget::Id(*user), None),
			)
		}
		Command::ChangePermission { name, value } => {
			let (token, channel) = session.channel_scope()?;
			(moderation(channel), Request::change_permission(channel, token, name, *value))
		}
		Command::OpenList(kind) => return list_request(session, *kind).map(Some),
		Command::ClearChannel | Command::CloseLists | Command::StartPolling | Command::StopPolling => return Ok(None),
	};
	Ok(Some(built))
}

fn moderation(channel: ChannelId) -> RequestKind {
	RequestKind::Moderation {
		channel,
		expect_accepted: false,
	}
}

/// Snapshot fetch for one list.
pub fn list_request(session: &SessionContext, kind: ListKind) -> Result<(RequestKind, Request), ClientCoreError> {
	let token = session.token()?;
	let channel = || session.channel_id().ok_or(ClientCoreError::NotInChannel);
	let (request_kind, endpoint) = match kind {
		ListKind::Channels => (RequestKind::ChannelDirectory, Endpoint::ChannelDirectory),
		ListKind::Members => {
			let c = channel()?;
			(RequestKind::MemberList(c), Endpoint::MemberList(c))
		}
		ListKind::Ranks => {
			let c = channel()?;
			(RequestKind::RankList(c), Endpoint::Ranks(c))
		}
		ListKind::Bans => {
			let c = channel()?;
			(RequestKind::BanList(c), Endpoint::Bans(c))
		}
		ListKind::Permissions => {
			let c = channel()?;
			(
				RequestKind::Permissions {
					channel: c,
					open_list: true,
				},
				Endpoint::Permissions(c),
			)
		}
		ListKind::Groups => {
			let c = channel()?;
			(
				RequestKind::Groups {
					channel: c,
					open_list: true,
				},
				Endpoint::Groups(c),
			)
		}
	};
	Ok((request_kind, Request::with_session(endpoint, token)))
}
