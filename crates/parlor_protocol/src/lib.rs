#![forbid(unsafe_code)]

//! Wire contract of the channel chat service: endpoint paths, request bodies,
//! response payloads and the tagged event stream returned by message polls.

pub mod endpoint;
pub mod event;
pub mod request;
pub mod response;

pub use endpoint::Endpoint;
pub use event::{ChannelEvent, ChatMessage, EventDecodeError, EventKind, SystemMessage, decode_batch, decode_event};
pub use request::Request;
pub use response::{
	BanListPayload, ChannelDirectoryPayload, ChannelLookupPayload, DirectoryChannel, EventBatchPayload, GroupsPayload,
	JoinPayload, ListOrMap, LoginPayload, MemberListPayload, PayloadError, PermissionsPayload, RankListPayload, Response,
	ResponseStatus,
};
