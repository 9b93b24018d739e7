use serde::Deserialize;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use super::SettingsError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ServerSettings {
    /// 바인딩 주소 (기본값: 0.0.0.0)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: IpAddr,

    /// HTTP 포트 (기본값: 80)
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_listen_addr() -> IpAddr { IpAddr::V4(Ipv4Addr::UNSPECIFIED) }
fn default_http_port() -> u16 { 80 }

pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T, SettingsError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            listen_addr: parse_env_var("PROXY_LISTEN_ADDR", default_listen_addr)?,
            http_port: parse_env_var("PROXY_HTTP_PORT", default_http_port)?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.http_port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            http_port: default_http_port(),
        }
    }
}
