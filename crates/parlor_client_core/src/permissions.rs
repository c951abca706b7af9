use parlor_domain::{PermissionEntry, Rank};

use crate::session::SessionContext;

pub const TALK: &str = "talk";
pub const KICK: &str = "kick";
pub const TEMP_BAN: &str = "tempban";
pub const RESET: &str = "reset";
pub const RANK_CHANGE: &str = "rankchange";
pub const PERM_BAN: &str = "permban";
pub const PERMISSION_CHANGE: &str = "permissionchange";

/// True iff the named permission exists and the user's rank meets it.
/// Absent permission or absent rank both deny.
pub fn has_permission(session: &SessionContext, name: &str) -> bool {
	match (session.user_rank(), session.permission(name)) {
		(Some(rank), Some(entry)) => rank >= entry.value,
		_ => false,
	}
}

/// Channel-wide controls the presentation layer may expose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GatedActions {
	pub can_talk: bool,
	pub can_temp_ban: bool,
	pub can_reset: bool,
	pub can_change_ranks: bool,
	pub can_change_bans: bool,
	pub can_change_permissions: bool,
}

impl GatedActions {
	pub fn derive(session: &SessionContext) -> Self {
		Self {
			can_talk: has_permission(session, TALK),
			can_temp_ban: has_permission(session, TEMP_BAN),
			can_reset: has_permission(session, RESET),
			can_change_ranks: has_permission(session, RANK_CHANGE),
			can_change_bans: has_permission(session, PERM_BAN),
			can_change_permissions: has_permission(session, PERMISSION_CHANGE),
		}
	}
}

/// Options offered for one row of the member list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberActions {
	pub can_kick: bool,
	pub can_kick_and_ban: bool,
	/// Give an unranked member a rank.
	pub can_rank: bool,
}

impl MemberActions {
	pub fn for_target(session: &SessionContext, target_group: Rank) -> Self {
		let outranks = session.user_rank().is_some_and(|r| r > target_group);
		let can_kick = outranks && has_permission(session, KICK);
		Self {
			can_kick,
			can_kick_and_ban: can_kick && has_permission(session, TEMP_BAN),
			can_rank: target_group == Rank::UNRANKED && has_permission(session, RANK_CHANGE),
		}
	}
}

/// A rank-list row is editable only for groups strictly below the user.
pub fn can_modify_rank(session: &SessionContext, group: Rank) -> bool {
	session.user_rank().is_some_and(|r| r > group)
}

/// A permission row is editable when the user currently holds it.
pub fn can_edit_permission(session: &SessionContext, permission: &PermissionEntry) -> bool {
	session.user_rank().is_some_and(|r| r >= permission.value)
}
