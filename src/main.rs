#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = das_rust::run().await {
        eprintln!("das-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
