use parlor_domain::{BanDuration, ChannelId, Rank, SessionToken, UserId, UserTarget};
use serde_json::{Value, json};

use crate::Endpoint;

/// Outbound request: an endpoint and its JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
	pub endpoint: Endpoint,
	pub body: Value,
}

impl Request {
	pub fn new(endpoint: Endpoint, body: Value) -> Self {
		Self { endpoint, body }
	}

	/// Body carrying only the session token.
	pub fn with_session(endpoint: Endpoint, session: &SessionToken) -> Self {
		Self::new(endpoint, json!({ "session": session.as_str() }))
	}

	pub fn login(username: &str, password: &str) -> Self {
		Self::new(Endpoint::Login, json!({ "username": username, "password": password }))
	}

	pub fn logout(session: &SessionToken) -> Self {
		Self::with_session(Endpoint::Logout, session)
	}

	pub fn create_account(login_name: &str, username: &str, password: &str) -> Self {
		Self::new(
			Endpoint::CreateAccount,
			json!({ "username": username, "loginName": login_name, "password": password }),
		)
	}

	pub fn send_message(channel: ChannelId, session: &SessionToken, message: &str) -> Self {
		Self::new(
			Endpoint::SendMessage(channel),
			json!({ "session": session.as_str(), "message": message }),
		)
	}

	/// Moderation body. The target is sent as `userID` or `username` depending on its form.
	pub fn targeted(endpoint: Endpoint, session: &SessionToken, target: &UserTarget, duration: Option<BanDuration>) -> Self {
		let mut body = json!({ "session": session.as_str() });
		match target {
			UserTarget::Id(id) => body["userID"] = json!(id.get()),
			UserTarget::Name(name) => body["username"] = json!(name),
		}
		if let Some(duration) = duration {
			body["duration"] = json!(duration.minutes());
		}
		Self::new(endpoint, body)
	}

	pub fn change_rank(channel: ChannelId, session: &SessionToken, user: UserId, rank: Rank) -> Self {
		Self::new(
			Endpoint::RankUpdate(channel),
			json!({ "session": session.as_str(), "userID": user.get(), "rankID": rank.get() }),
		)
	}

	pub fn change_permission(channel: ChannelId, session: &SessionToken, name: &str, value: Rank) -> Self {
		Self::new(
			Endpoint::PermissionChange(channel),
			json!({ "session": session.as_str(), "permissionName": name, "value": value.get() }),
		)
	}
}
