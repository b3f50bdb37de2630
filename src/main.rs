use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    insurance_bot::run().await
}
