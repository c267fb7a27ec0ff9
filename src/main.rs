#[tokio::main]
async fn main() -> anyhow::Result<()> {
    emotutor_lib::run().await
}
