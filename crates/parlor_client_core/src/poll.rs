use std::time::Duration;

use parlor_domain::ChannelId;
use tracing::debug;

use crate::config::PollTimings;

/// Side effects requested by the poll loop. The caller performs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
	/// Issue one message poll for the channel.
	Fetch { channel: ChannelId },
	/// Arm the (single) poll timer.
	Schedule(Duration),
	CancelTimer,
}

/// How a poll request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
	/// 200 with this many events.
	Events(usize),
	/// 204.
	Empty,
	/// Error status or transport failure.
	Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
	Idle,
	Polling,
	Scheduled,
}

/// Message poll scheduler.
///
/// Holds at most one outstanding request and at most one timer; the two are
/// never live at the same time.
#[derive(Debug, Clone)]
pub struct PollLoop {
	timings: PollTimings,
	channel: Option<ChannelId>,
	looping: bool,
	in_flight: bool,
	timer_armed: bool,
}

impl PollLoop {
	pub fn new(timings: PollTimings) -> Self {
		Self {
			timings,
			channel: None,
			looping: false,
			in_flight: false,
			timer_armed: false,
		}
	}

	pub fn phase(&self) -> PollPhase {
		if self.in_flight {
			PollPhase::Polling
		} else if self.timer_armed {
			PollPhase::Scheduled
		} else {
			PollPhase::Idle
		}
	}

	pub fn is_looping(&self) -> bool {
		self.looping
	}

	pub fn channel(&self) -> Option<ChannelId> {
		self.channel
	}

	/// Begin or resume looping for `channel`.
	pub fn start(&mut self, channel: ChannelId) -> Vec<PollAction> {
		self.channel = Some(channel);
		self.looping = true;
		if self.in_flight || self.timer_armed {
			debug!(%channel, phase = ?self.phase(), "poll start: already active");
			return Vec::new();
		}
		self.in_flight = true;
		vec![PollAction::Fetch { channel }]
	}

	/// Poll now without waiting for the timer. Ignored while a poll is outstanding.
	pub fn request_now(&mut self) -> Vec<PollAction> {
		let Some(channel) = self.channel else {
			return Vec::new();
		};
		if self.in_flight {
			debug!(%channel, "immediate poll skipped: request in flight");
			return Vec::new();
		}
		let mut actions = Vec::with_capacity(2);
		if self.timer_armed {
			self.timer_armed = false;
			actions.push(PollAction::CancelTimer);
		}
		self.in_flight = true;
		actions.push(PollAction::Fetch { channel });
		actions
	}

	/// Stop looping and drain once. A poll already in flight serves as the drain.
	pub fn stop(&mut self) -> Vec<PollAction> {
		if !self.looping && !self.timer_armed {
			self.channel = None;
			return Vec::new();
		}
		self.looping = false;
		let mut actions = Vec::with_capacity(2);
		if self.timer_armed {
			self.timer_armed = false;
			actions.push(PollAction::CancelTimer);
		}
		if !self.in_flight
			&& let Some(channel) = self.channel
		{
			self.in_flight = true;
			actions.push(PollAction::Fetch { channel });
		}
		self.channel = None;
		actions
	}

	/// Stop without the drain poll.
	pub fn halt(&mut self) -> Vec<PollAction> {
		self.looping = false;
		self.channel = None;
		if self.timer_armed {
			self.timer_armed = false;
			return vec![PollAction::CancelTimer];
		}
		Vec::new()
	}

	/// Record the end of the outstanding poll and decide what comes next.
	pub fn on_batch(&mut self, outcome: PollOutcome) -> Vec<PollAction> {
		self.in_flight = false;
		let delay = match outcome {
			PollOutcome::Failed => {
				self.looping = false;
				return Vec::new();
			}
			PollOutcome::Events(n) if n > 0 => self.timings.active_interval,
			PollOutcome::Events(_) | PollOutcome::Empty => self.timings.idle_interval,
		};
		if !self.looping || self.channel.is_none() {
			return Vec::new();
		}
		self.timer_armed = true;
		vec![PollAction::Schedule(delay)]
	}

	/// The armed timer fired.
	pub fn on_timer(&mut self) -> Vec<PollAction> {
		if !self.timer_armed {
			return Vec::new();
		}
		self.timer_armed = false;
		match self.channel {
			Some(channel) if self.looping && !self.in_flight => {
				self.in_flight = true;
				vec![PollAction::Fetch { channel }]
			}
			_ => Vec::new(),
		}
	}
}
