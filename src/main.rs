#[tokio::main]
async fn main() {
    if let Err(err) = card_scanner_lib::run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
