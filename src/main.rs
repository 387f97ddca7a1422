#[tokio::main]
async fn main() {
    std::process::exit(packet_dispatch::app::startup::startup().await);
}
