//! Serves the system's temporary directory to the users listed in `credentials.json`.

use ftpengine_auth_jsonfile::{JsonFileAuthenticator, JsonUser};
use ftpengine_driver_fs::Filesystem;
use libftpengine::ServerBuilder;
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    pretty_env_logger::init();

    let authenticator = Arc::new(JsonFileAuthenticator::from_file("credentials.json")?);

    let addr = "127.0.0.1:2121";
    let ftp_home = std::env::temp_dir();
    let factory = Box::new(move || Filesystem::new(ftp_home.clone()).unwrap());
    let server = ServerBuilder::<Filesystem, JsonUser>::with_authenticator(factory, authenticator.clone())
        .authorizer(authenticator)
        .metrics(true)
        .shutdown_indicator(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .build()?;

    info!("Starting ftp server on {}", addr);
    server.listen(addr).await?;
    Ok(())
}
