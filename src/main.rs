use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    packfetch::run().await
}
