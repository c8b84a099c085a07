//! Serves the system's temporary directory to anyone, until Ctrl-C is pressed.

use ftpengine_driver_fs::Filesystem;
use libftpengine::ServerBuilder;
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    pretty_env_logger::init();

    let addr = "127.0.0.1:2121";
    let ftp_home = std::env::temp_dir();
    let server = ServerBuilder::new(Box::new(move || Filesystem::new(ftp_home.clone()).unwrap()))
        .greeting("Welcome to the basic demo")
        .passive_ports(50000..=50100)
        .shutdown_indicator(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl-C, shutting down");
        })
        .build()?;

    info!("Starting ftp server on {}", addr);
    server.listen(addr).await?;
    Ok(())
}
