#[tokio::main]
async fn main() -> anyhow::Result<()> {
    doctor_report_worker::run().await
}
