use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = counsel_api::Args::parse();
	counsel_api::run(args).await
}
