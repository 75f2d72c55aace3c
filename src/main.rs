#[tokio::main]
async fn main() -> anyhow::Result<()> {
    scanview::boot::init_logging();
    let matches = scanview::cli::parse_args();
    scanview::cli::run(&matches).await
}
