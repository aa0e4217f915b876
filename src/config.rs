use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::sync::OnceLock;

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:5000";
const DEFAULT_PUBLIC_RPS: u32 = 100;
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct Config {
    pub server_address: String,
    pub telegram_bot_token: String,
    pub public_rps: u32,
    pub max_body_bytes: usize,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let telegram_bot_token = require_token(get_env("BOT_TOKEN")?)?;

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS.to_string())?,
            telegram_bot_token,
            public_rps: get_env_or("PUBLIC_RPS", DEFAULT_PUBLIC_RPS)?,
            max_body_bytes: get_env_or("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
        })
    }
}

// The bot token never goes to the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_address", &self.server_address)
            .field("telegram_bot_token", &"<redacted>")
            .field("public_rps", &self.public_rps)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn require_token(raw: String) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(Error::Config("BOT_TOKEN must not be empty".to_string()));
    }
    Ok(raw)
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
