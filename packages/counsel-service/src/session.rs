use std::future::Future;

use tokio::sync::watch;

use crate::{Error, Result};

/// Generation counter that lets a newer comparison invalidate results still in flight.
///
/// Only the most recently started run may deliver its result; every older run resolves to
/// [`Error::Superseded`] as soon as a newer one begins.
#[derive(Debug)]
pub struct CompareSession {
	generation: watch::Sender<u64>,
}
impl CompareSession {
	pub fn new() -> Self {
		let (generation, _) = watch::channel(0);

		Self { generation }
	}

	pub fn current(&self) -> u64 {
		*self.generation.borrow()
	}

	/// Starts a new generation and runs `fut` under it.
	pub async fn run<F, T>(&self, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		let (id, mut rx) = self.begin();

		tokio::select! {
			biased;
			_ = superseded(&mut rx, id) => Err(Error::Superseded),
			result = fut => {
				if self.current() != id {
					return Err(Error::Superseded);
				}

				result
			},
		}
	}

	fn begin(&self) -> (u64, watch::Receiver<u64>) {
		let mut id = 0;

		self.generation.send_modify(|generation| {
			*generation += 1;
			id = *generation;
		});

		(id, self.generation.subscribe())
	}
}
impl Default for CompareSession {
	fn default() -> Self {
		Self::new()
	}
}

async fn superseded(rx: &mut watch::Receiver<u64>, id: u64) {
	loop {
		if *rx.borrow_and_update() != id {
			return;
		}
		if rx.changed().await.is_err() {
			std::future::pending::<()>().await;
		}
	}
}

#[cfg(test)]
mod tests {
	use std::{sync::Arc, time::Duration};

	use crate::{Error, session::CompareSession};

	#[tokio::test(start_paused = true)]
	async fn latest_run_wins() {
		let session = Arc::new(CompareSession::new());
		let slow = {
			let session = session.clone();

			tokio::spawn(async move {
				session
					.run(async {
						tokio::time::sleep(Duration::from_millis(500)).await;

						Ok::<_, Error>("first")
					})
					.await
			})
		};

		tokio::time::sleep(Duration::from_millis(10)).await;

		let second = session.run(async { Ok::<_, Error>("second") }).await;
		let first = slow.await.expect("Task must not panic.");

		assert!(matches!(first, Err(Error::Superseded)));
		assert_eq!(second.expect("Latest run must deliver."), "second");
		assert_eq!(session.current(), 2);
	}

	#[tokio::test]
	async fn sequential_runs_all_deliver() {
		let session = CompareSession::new();

		for expected in 1..=3_u64 {
			let value = session.run(async { Ok::<_, Error>(expected) }).await;

			assert_eq!(value.expect("Uncontested run must deliver."), expected);
		}
	}
}
