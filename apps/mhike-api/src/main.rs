use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = mhike_api::Args::parse();

	mhike_api::run(args).await
}
