#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = literexia_api::run().await {
        eprintln!("literexia-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
