use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use tracing::info;

pub struct Config {
    pub address: SocketAddr,
    pub database_url: String,
    pub media_root: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let host: std::net::IpAddr = try_load("HOST", "127.0.0.1")?;
        let port: u16 = try_load("PORT", "3001")?;
        Ok(Self {
            address: SocketAddr::new(host, port),
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            media_root: try_load("MEDIA_ROOT", "media")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value {value:?}: {e}"))
}
