use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    parking_deployer::start(std::env::args()).await
}
