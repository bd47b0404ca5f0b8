use clap::Parser;

use counsel_eval::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	counsel_eval::run(args).await
}
