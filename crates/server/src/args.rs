use clap::Parser;
use figment::{
    Figment, Metadata, Profile, Provider,
    value::{Dict, Map},
};
use std::{net::IpAddr, path::PathBuf};
use wallet_sync::SyncConfig;

/// Command line arguments of the server. Set flags override the config file and environment.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "wallet-sync-server", version, about)]
pub struct ServerArgs {
    /// Interface to bind to.
    #[arg(long, value_name = "IP")]
    pub host: Option<IpAddr>,

    /// Port to listen on. `0` picks a free port.
    #[arg(long, short, value_name = "PORT")]
    pub port: Option<u16>,

    /// Path of the config file.
    #[arg(long, short, value_name = "PATH", env = "WALLET_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Name of the wallet cookie.
    #[arg(long, value_name = "NAME")]
    pub cookie_name: Option<String>,

    /// Only send the wallet cookie over HTTPS.
    #[arg(long)]
    pub secure_cookie: bool,
}

impl ServerArgs {
    /// Values explicitly set on the command line, keyed like [`SyncConfig`].
    pub fn dict(&self) -> Dict {
        let mut dict = Dict::new();
        if let Some(host) = self.host {
            dict.insert("host".into(), host.to_string().into());
        }
        if let Some(port) = self.port {
            dict.insert("port".into(), port.into());
        }
        if let Some(name) = &self.cookie_name {
            dict.insert("cookie_name".into(), name.clone().into());
        }
        if self.secure_cookie {
            dict.insert("cookie_secure".into(), true.into());
        }
        dict
    }

    /// The full figment: config file and environment, then these arguments.
    pub fn figment(&self) -> Figment {
        let figment = match &self.config {
            Some(path) => SyncConfig::figment_with_file(path),
            None => SyncConfig::figment(),
        };
        figment.merge(self.clone())
    }

    pub fn load_config(&self) -> Result<SyncConfig, figment::Error> {
        SyncConfig::try_from(self.figment())
    }
}

impl Provider for ServerArgs {
    fn metadata(&self) -> Metadata {
        Metadata::named("ServerArgs")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Ok(Map::from([(Profile::Default, self.dict())]))
    }
}
