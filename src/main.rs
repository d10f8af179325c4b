use silogs::cli::Cli;

#[tokio::main]
async fn main() {
    // Failures are reported by the CLI itself
    if Cli::run().await.is_err() {
        std::process::exit(1);
    }
}
