use std::collections::VecDeque;

use parlor_domain::{Colour, Rank, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeTone {
	Success,
	Warning,
}

/// One line of the message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
	System {
		text: String,
		colour: Colour,
		/// Global announcements render emphasised.
		emphasis: bool,
	},
	Chat {
		sender_id: Option<UserId>,
		sender_name: String,
		sender_rank: Option<Rank>,
		/// Group name for `sender_rank`, when known at the time the line arrived.
		rank_name: Option<String>,
		text: String,
	},
	/// Client-side line, e.g. a command confirmation.
	Notice { text: String, tone: NoticeTone },
}

impl LogEntry {
	pub fn text(&self) -> &str {
		match self {
			Self::System { text, .. } | Self::Chat { text, .. } | Self::Notice { text, .. } => text,
		}
	}
}

/// Bounded log; the oldest line goes first once full.
#[derive(Debug, Clone)]
pub struct MessageLog {
	entries: VecDeque<LogEntry>,
	capacity: usize,
}

impl MessageLog {
	pub fn with_capacity(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			entries: VecDeque::with_capacity(capacity.min(1024)),
			capacity,
		}
	}

	pub fn push(&mut self, entry: LogEntry) -> &LogEntry {
		if self.entries.len() == self.capacity {
			self.entries.pop_front();
		}
		self.entries.push_back(entry);
		&self.entries[self.entries.len() - 1]
	}

	pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
		self.entries.iter()
	}

	pub fn last(&self) -> Option<&LogEntry> {
		self.entries.back()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
