#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context as _;
use parlor_client_core::{
	ClientController, Command, LogEntry, NoticeTone, SessionEvent, UiEvent, load_client_config,
	load_client_config_from_path, start_client,
};
use parlor_domain::{ChannelId, UserId, UserTarget};
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing::{info, warn};

fn usage_and_exit() -> ! {
	eprintln!(
		"Usage: parlor_client --user NAME [--password P] [--base-url URL] [--channel ID | --channel-name NAME] [--config PATH]\n\
\n\
Options:\n\
	--base-url      Service root (default: from config, else http://localhost:8080/ChatServer/)\n\
	--user          Login name\n\
	--password      Password (default: $PARLOR_PASSWORD)\n\
	--channel       Channel id to join after signing in\n\
	--channel-name  Channel name to join after signing in\n\
	--config        Config file (default: ~/.parlor/client.toml)\n\
	--help          Show this help\n\
\n\
Input:\n\
	Plain lines are sent to the channel. Commands:\n\
	/leave  /kick NAME  /tempban NAME MINUTES  /reset  /quit\n\
	NAME may be #ID to target a user id.\n"
	);
	std::process::exit(2)
}

fn init_tracing() {
	let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,parlor_client_core=debug".to_string());
	tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

struct Args {
	base_url: Option<String>,
	user: String,
	password: Option<String>,
	join: Option<Command>,
	config: Option<PathBuf>,
}

fn non_empty(flag: &str, v: Option<String>) -> String {
	match v {
		Some(v) if !v.trim().is_empty() => v,
		_ => {
			eprintln!("{flag} must be non-empty");
			usage_and_exit()
		}
	}
}

fn parse_args() -> Args {
	let mut base_url = None;
	let mut user = None;
	let mut password = None;
	let mut join = None;
	let mut config = None;

	let mut it = std::env::args().skip(1);
	while let Some(arg) = it.next() {
		match arg.as_str() {
			"--help" | "-h" => usage_and_exit(),
			"--base-url" => base_url = Some(non_empty("--base-url", it.next())),
			"--user" => user = Some(non_empty("--user", it.next())),
			"--password" => password = Some(non_empty("--password", it.next())),
			"--channel" => {
				let v = non_empty("--channel", it.next());
				let channel: ChannelId = v.parse().unwrap_or_else(|e| {
					eprintln!("Invalid --channel value: {v} ({e})");
					usage_and_exit()
				});
				join = Some(Command::JoinChannel { channel });
			}
			"--channel-name" => {
				join = Some(Command::JoinChannelByName {
					name: non_empty("--channel-name", it.next()),
				});
			}
			"--config" => config = Some(PathBuf::from(non_empty("--config", it.next()))),
			other => {
				eprintln!("Unknown argument: {other}");
				usage_and_exit();
			}
		}
	}

	let Some(user) = user else {
		eprintln!("--user is required");
		usage_and_exit();
	};

	Args {
		base_url,
		user,
		password,
		join,
		config,
	}
}

enum Input {
	Send(Command),
	Quit,
}

fn parse_target(s: &str) -> UserTarget {
	match s.strip_prefix('#').map(str::parse::<UserId>) {
		Some(Ok(id)) => UserTarget::Id(id),
		_ => UserTarget::from(s),
	}
}

fn parse_line(line: &str) -> Result<Option<Input>, String> {
	let line = line.trim();
	if line.is_empty() {
		return Ok(None);
	}
	let Some(rest) = line.strip_prefix('/') else {
		return Command::send_message(line)
			.map(|c| Some(Input::Send(c)))
			.map_err(|e| e.to_string());
	};

	let mut words = rest.split_whitespace();
	let cmd = match (words.next(), words.next(), words.next()) {
		(Some("quit"), None, None) => return Ok(Some(Input::Quit)),
		(Some("leave"), None, None) => Command::LeaveChannel,
		(Some("reset"), None, None) => Command::ResetChannel,
		(Some("kick"), Some(name), None) => Command::Kick {
			target: parse_target(name),
		},
		(Some("tempban"), Some(name), Some(minutes)) => {
			Command::temp_ban(parse_target(name), minutes).map_err(|e| e.to_string())?
		}
		_ => return Err(format!("unknown command: /{rest}")),
	};
	Ok(Some(Input::Send(cmd)))
}

fn render(entry: &LogEntry) -> String {
	match entry {
		LogEntry::System { text, emphasis: true, .. } => format!("*** {text} ***"),
		LogEntry::System { text, .. } => format!("* {text}"),
		LogEntry::Chat {
			sender_name,
			rank_name,
			text,
			..
		} => match rank_name {
			Some(rank) => format!("[{rank}] {sender_name}: {text}"),
			None => format!("{sender_name}: {text}"),
		},
		LogEntry::Notice {
			text,
			tone: NoticeTone::Warning,
		} => format!("! {text}"),
		LogEntry::Notice { text, .. } => format!("- {text}"),
	}
}

async fn on_ui_event(event: UiEvent, controller: &ClientController, join: &mut Option<Command>) -> anyhow::Result<()> {
	match event {
		UiEvent::MessageAppended(entry) => println!("{}", render(&entry)),
		UiEvent::Session(SessionEvent::SignedIn { username, .. }) => {
			info!(%username, "signed in");
			if let Some(cmd) = join.take() {
				controller.submit(cmd).await?;
			}
		}
		UiEvent::Session(SessionEvent::ChannelJoined { channel, details, .. }) => {
			println!("-- joined {} (#{channel})", details.name);
		}
		UiEvent::Session(SessionEvent::ChannelLeft { channel }) => println!("-- left #{channel}"),
		UiEvent::Session(SessionEvent::DetailsChanged(details)) => println!("-- channel is now {}", details.name),
		UiEvent::Error { context, message } => eprintln!("error ({context}): {message}"),
		UiEvent::Diagnostic(message) => warn!(%message, "protocol diagnostic"),
		UiEvent::ListChanged(_) | UiEvent::GatedActionsChanged(_) | UiEvent::Session(_) => {}
	}
	Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	init_tracing();
	let args = parse_args();

	let mut cfg = match &args.config {
		Some(path) => load_client_config_from_path(path)?,
		None => load_client_config()?,
	};
	if let Some(base_url) = args.base_url {
		cfg.base_url = base_url;
	}

	let password = args
		.password
		.or_else(|| std::env::var("PARLOR_PASSWORD").ok().filter(|v| !v.is_empty()))
		.context("no password: pass --password or set PARLOR_PASSWORD")?;

	info!(base_url = %cfg.base_url, user = %args.user, "starting");
	let (controller, mut ui_rx, shutdown) = start_client(cfg)?;
	controller.submit(Command::sign_in(args.user, password)).await?;

	let mut join = args.join;
	let mut lines = BufReader::new(tokio::io::stdin()).lines();

	loop {
		tokio::select! {
			ev = ui_rx.recv() => {
				let Some(ev) = ev else {
					warn!("client task ended");
					break;
				};
				on_ui_event(ev, &controller, &mut join).await?;
			}

			line = lines.next_line() => {
				let Some(line) = line.context("read stdin")? else {
					break;
				};
				match parse_line(&line) {
					Ok(Some(Input::Quit)) => break,
					Ok(Some(Input::Send(cmd))) => controller.submit(cmd).await?,
					Ok(None) => {}
					Err(e) => eprintln!("{e}"),
				}
			}
		}
	}

	info!("signing out");
	tokio::task::spawn_blocking(move || shutdown.shutdown())
		.await
		.context("join client thread")?;
	Ok(())
}
