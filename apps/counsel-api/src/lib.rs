pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use tokio::net::TcpListener;

use crate::state::AppState;
use counsel_storage::qdrant::QdrantStore;

#[derive(Debug, Parser)]
#[command(
	version = counsel_cli::VERSION,
	rename_all = "kebab",
	styles = counsel_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = counsel_config::load(&args.config)?;

	counsel_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;

	check_collections(&config).await;

	let state = AppState::new(config)?;
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(listener, app).await?;

	Ok(())
}

/// Missing collections degrade searches at request time, so startup only reports them.
async fn check_collections(config: &counsel_config::Config) {
	let store = match QdrantStore::new(&config.storage.qdrant) {
		Ok(store) => store,
		Err(err) => {
			tracing::warn!(error = %err, "Failed to build Qdrant client for startup checks.");

			return;
		},
	};
	let mut collections: Vec<&str> = config
		.modes
		.values()
		.map(|mode| counsel_config::collection_for(config, mode))
		.collect();

	collections.sort_unstable();
	collections.dedup();

	for collection in collections {
		match store.collection_exists(collection).await {
			Ok(true) => tracing::info!(collection, "Qdrant collection is available."),
			Ok(false) => tracing::warn!(collection, "Qdrant collection does not exist."),
			Err(err) => tracing::warn!(error = %err, collection, "Qdrant is unreachable."),
		}
	}
}
