use std::sync::Arc;

use futures::StreamExt as _;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use parlor_protocol::Response;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::engine::{ClientAction, Engine};
use crate::error::{ClientCoreError, TransportError};
use crate::gateway::{Command, RequestKind};
use crate::sink::{ChannelSink, ClientSink, UiEvent};
use crate::state::ClientSnapshot;
use crate::transport::{HttpTransport, Transport};

type Completion = BoxFuture<'static, (RequestKind, Result<Response, TransportError>)>;

#[derive(Debug)]
pub enum ClientCommand {
	Submit(Command),
	Snapshot { reply: oneshot::Sender<ClientSnapshot> },
}

/// Handle for driving a running client task.
#[derive(Clone)]
pub struct ClientController {
	cmd_tx: mpsc::Sender<ClientCommand>,
}

impl ClientController {
	pub fn new(cmd_tx: mpsc::Sender<ClientCommand>) -> Self {
		Self { cmd_tx }
	}

	pub async fn submit(&self, command: Command) -> Result<(), ClientCoreError> {
		self.cmd_tx
			.send(ClientCommand::Submit(command))
			.await
			.map_err(|_| ClientCoreError::Stopped)
	}

	pub async fn snapshot(&self) -> Result<ClientSnapshot, ClientCoreError> {
		let (reply, rx) = oneshot::channel();
		self.cmd_tx
			.send(ClientCommand::Snapshot { reply })
			.await
			.map_err(|_| ClientCoreError::Stopped)?;
		rx.await.map_err(|_| ClientCoreError::Stopped)
	}
}

pub struct ShutdownHandle {
	shutdown_tx: oneshot::Sender<()>,
	join_handle: std::thread::JoinHandle<()>,
}

impl ShutdownHandle {
	pub fn new(shutdown_tx: oneshot::Sender<()>, join_handle: std::thread::JoinHandle<()>) -> Self {
		Self {
			shutdown_tx,
			join_handle,
		}
	}

	/// Signs out if needed and waits for the client thread to finish.
	pub fn shutdown(self) {
		let _ = self.shutdown_tx.send(());
		let _ = self.join_handle.join();
	}
}

/// Start the client on its own thread with the HTTP transport.
pub fn start_client(
	config: ClientConfig,
) -> Result<(ClientController, mpsc::UnboundedReceiver<UiEvent>, ShutdownHandle), ClientCoreError> {
	let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config)?);
	start_client_with_transport(config, transport)
}

pub fn start_client_with_transport(
	config: ClientConfig,
	transport: Arc<dyn Transport>,
) -> Result<(ClientController, mpsc::UnboundedReceiver<UiEvent>, ShutdownHandle), ClientCoreError> {
	let (cmd_tx, cmd_rx) = mpsc::channel::<ClientCommand>(128);
	let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
	let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

	let join_handle = std::thread::Builder::new()
		.name("parlor-client".to_string())
		.spawn(move || {
			let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
				Ok(rt) => rt,
				Err(e) => {
					error!(error = %e, "failed to build tokio runtime for the client");
					return;
				}
			};
			let engine = Engine::new(&config, ChannelSink::new(ui_tx));
			rt.block_on(run_client_task(engine, transport, cmd_rx, shutdown_rx));
		})
		.map_err(|e| ClientCoreError::Other(format!("spawn client thread: {e}")))?;

	Ok((
		ClientController::new(cmd_tx),
		ui_rx,
		ShutdownHandle::new(shutdown_tx, join_handle),
	))
}

struct Io {
	transport: Arc<dyn Transport>,
	in_flight: FuturesUnordered<Completion>,
	deadline: Option<Instant>,
}

impl Io {
	fn perform(&mut self, actions: Vec<ClientAction>) {
		for action in actions {
			match action {
				ClientAction::Send { kind, request } => {
					debug!(request = kind.context(), path = %request.endpoint, "send");
					let fut = self.transport.request(request);
					self.in_flight.push(Box::pin(async move { (kind, fut.await) }));
				}
				ClientAction::ScheduleTimer(delay) => {
					self.deadline = Some(Instant::now() + delay);
				}
				ClientAction::CancelTimer => {
					self.deadline = None;
				}
			}
		}
	}
}

/// Drive an engine until shutdown: commands, request completions and the poll timer.
pub async fn run_client_task<S: ClientSink>(
	mut engine: Engine<S>,
	transport: Arc<dyn Transport>,
	mut cmd_rx: mpsc::Receiver<ClientCommand>,
	mut shutdown_rx: oneshot::Receiver<()>,
) {
	let mut io = Io {
		transport,
		in_flight: FuturesUnordered::new(),
		deadline: None,
	};

	loop {
		tokio::select! {
			_ = &mut shutdown_rx => {
				info!("client shutting down");
				break;
			}

			cmd = cmd_rx.recv() => {
				let Some(cmd) = cmd else {
					debug!("all controllers dropped");
					break;
				};
				match cmd {
					ClientCommand::Submit(command) => {
						let name = command.name();
						match engine.submit(command) {
							Ok(actions) => io.perform(actions),
							Err(e) => {
								warn!(command = name, error = %e, "command rejected");
								engine.sink_mut().on_error(name, &e.to_string());
							}
						}
					}
					ClientCommand::Snapshot { reply } => {
						let _ = reply.send(engine.state().snapshot());
					}
				}
			}

			_ = tokio::time::sleep_until(io.deadline.unwrap_or_else(Instant::now)), if io.deadline.is_some() => {
				io.deadline = None;
				let actions = engine.handle_timer();
				io.perform(actions);
			}

			Some((kind, result)) = io.in_flight.next(), if !io.in_flight.is_empty() => {
				let actions = engine.handle_response(kind, result);
				io.perform(actions);
			}
		}
	}

	// Sign-out must complete before the task ends; nothing else is awaited.
	for action in engine.shutdown() {
		if let ClientAction::Send { kind, request } = action {
			let result = io.transport.request(request).await;
			engine.handle_response(kind, result);
		}
	}
}
