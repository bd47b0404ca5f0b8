use std::{
	collections::HashMap,
	future::Future,
	sync::{Arc, Mutex, PoisonError},
};

use counsel_service::{CompareSession, PipelineService, Result};

type Sessions = Arc<Mutex<HashMap<String, Arc<CompareSession>>>>;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PipelineService>,
	sessions: Sessions,
}
impl AppState {
	pub fn new(config: counsel_config::Config) -> color_eyre::Result<Self> {
		let service = PipelineService::new(config)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: PipelineService) -> Self {
		Self { service: Arc::new(service), sessions: Default::default() }
	}

	/// Runs `fut` in the session named `session_id`; a later run in the same session supersedes it.
	///
	/// The session entry only lives while at least one of its runs is in flight, including runs
	/// whose request was dropped mid-way.
	pub async fn run_in_session<F, T>(&self, session_id: &str, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		let lease = SessionLease::acquire(&self.sessions, session_id);

		lease.session.run(fut).await
	}

	/// Sessions with a run in flight.
	pub fn active_sessions(&self) -> usize {
		self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
	}
}

struct SessionLease {
	sessions: Sessions,
	session_id: String,
	session: Arc<CompareSession>,
}
impl SessionLease {
	fn acquire(sessions: &Sessions, session_id: &str) -> Self {
		let session = sessions
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.entry(session_id.to_string())
			.or_default()
			.clone();

		Self { sessions: sessions.clone(), session_id: session_id.to_string(), session }
	}
}
impl Drop for SessionLease {
	fn drop(&mut self) {
		let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

		// The map and this lease are the only owners once no other run holds the session.
		if let Some(entry) = sessions.get(&self.session_id)
			&& Arc::ptr_eq(entry, &self.session)
			&& Arc::strong_count(&self.session) == 2
		{
			sessions.remove(&self.session_id);
		}
	}
}
