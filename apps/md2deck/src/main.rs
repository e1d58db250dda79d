#[tokio::main]
async fn main() -> anyhow::Result<()> {
    md2deck::run().await
}
