use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = recon_api::Args::parse();

	recon_api::run(args).await
}
