//! Fixed-interval refresh scheduling.

// crates.io
use tokio::{
	sync::oneshot,
	task::JoinHandle,
	time::{self, MissedTickBehavior},
};
// self
use crate::{_prelude::*, cache::orchestrator::Orchestrator};

/// Default refresh period, one tick per minute.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to the background refresh loop.
#[derive(Debug)]
pub struct SchedulerHandle {
	shutdown: oneshot::Sender<()>,
	task: JoinHandle<()>,
}
impl SchedulerHandle {
	/// Start ticking `orchestrator` every `period`.
	///
	/// The first tick runs immediately. Ticks that fall due while a refresh is still running are
	/// dropped rather than queued.
	pub fn spawn(orchestrator: Orchestrator, period: Duration) -> Result<Self> {
		if period.is_zero() {
			return Err(Error::Validation {
				field: "refresh_interval",
				reason: "Must be greater than zero.".into(),
			});
		}

		let (shutdown, mut stop) = oneshot::channel();
		let task = tokio::spawn(async move {
			let mut ticker = time::interval(period);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

			loop {
				tokio::select! {
					_ = &mut stop => {
						tracing::info!("refresh scheduler shutting down");

						break;
					},
					_ = ticker.tick() => {
						orchestrator.tick().await;
					},
				}
			}
		});

		tracing::info!(period = ?period, "refresh scheduler started");

		Ok(Self { shutdown, task })
	}

	/// Stop the loop after the in-flight tick, if any, and wait for it to exit.
	pub async fn shutdown(self) {
		let _ = self.shutdown.send(());

		if let Err(err) = self.task.await {
			tracing::warn!(error = %err, "refresh scheduler task ended abnormally");
		}
	}
}
