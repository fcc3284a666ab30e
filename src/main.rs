use virt_secret::error;
use virt_secret::server;
use virt_secret::settings;

#[tokio::main]
async fn main() -> Result<(), error::Error> {
    let settings = settings::Settings::load()?;

    structured_logger::Builder::with_level(&settings.log_level)
        .with_target_writer(
            "*",
            structured_logger::async_json::new_writer(tokio::io::stdout()),
        )
        .init();

    log::info!(
        "Starting secret daemon on the '{}' bus as '{}'",
        settings.bus,
        settings.dbus_name
    );

    let daemon = server::SecretDaemon::new(&settings).await?;
    daemon.run().await?;

    Ok(())
}
