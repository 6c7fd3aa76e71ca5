//! tppv: PSD2 TPP certificate verification service.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tppv::run().await
}
