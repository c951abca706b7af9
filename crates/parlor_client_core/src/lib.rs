#![forbid(unsafe_code)]
//! Incremental state sync for a parlor chat client.
//!
//! [`Engine`] is the synchronous core: commands and responses go in, actions
//! come out. [`runtime`] drives an engine over a [`Transport`] on a tokio task.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod log;
pub mod permissions;
pub mod poll;
pub mod runtime;
pub mod session;
pub mod sink;
pub mod state;
pub mod store;
pub mod transport;

pub use config::{ClientConfig, PollTimings, load_client_config, load_client_config_from_path};
pub use engine::{ClientAction, Engine};
pub use error::{ClientCoreError, TransportError};
pub use gateway::{Command, Password, RequestKind};
pub use log::{LogEntry, MessageLog, NoticeTone};
pub use permissions::{GatedActions, MemberActions};
pub use runtime::{ClientController, ShutdownHandle, start_client, start_client_with_transport};
pub use session::SessionContext;
pub use sink::{ChannelSink, ClientSink, ListKind, RecordingSink, SessionEvent, UiEvent};
pub use state::{ClientSnapshot, ClientState};
pub use transport::{HttpTransport, Transport};
