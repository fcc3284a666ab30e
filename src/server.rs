use crate::error;
use crate::object;
use crate::settings;
use crate::store;

#[derive(Debug)]
pub struct SecretDaemon {
    connection: zbus::Connection,
    dbus_name: String,
    store: store::SharedStore,
}

impl SecretDaemon {
    pub async fn new(settings: &settings::Settings) -> Result<Self, error::Error> {
        let connection = match settings.bus.as_str() {
            "session" => zbus::Connection::session().await?,
            "system" => zbus::Connection::system().await?,
            address => zbus::connection::Builder::address(address)?.build().await?,
        };

        Ok(Self {
            connection,
            dbus_name: settings.dbus_name.to_owned(),
            store: store::SecretStore::new(settings.max_value_len).shared(),
        })
    }

    pub async fn run(self) -> Result<(), error::Error> {
        let driver = object::driver::SecretDriver::new(self.store.clone());

        self.connection
            .object_server()
            .at(object::SECRET_ROOT_PATH, driver)
            .await?;

        let dbus_name = self.dbus_name;
        self.connection.request_name(dbus_name.as_str()).await?;

        log::info!("Dbus assigned name '{dbus_name}' to secret daemon");

        loop {
            // Handling D-Bus messages is done in the background
            std::future::pending::<()>().await;
        }
    }
}

/// Start a daemon inside this process, connected to the returned client
/// connection over a Unix socket pair.
///
/// Returns `(daemon, client)`. The daemon side stops serving once its
/// connection is dropped.
pub async fn in_process(
    store: store::SecretStore,
) -> Result<(zbus::Connection, zbus::Connection), error::Error> {
    let (daemon_stream, client_stream) = tokio::net::UnixStream::pair()?;
    let guid = zbus::Guid::generate();

    let daemon = zbus::connection::Builder::unix_stream(daemon_stream)
        .server(guid)?
        .p2p()
        .serve_at(
            object::SECRET_ROOT_PATH,
            object::driver::SecretDriver::new(store.shared()),
        )?
        .build();
    let client = zbus::connection::Builder::unix_stream(client_stream)
        .p2p()
        .build();

    let (daemon, client) = futures::try_join!(daemon, client)?;

    log::debug!("Started in-process secret daemon");

    Ok((daemon, client))
}
