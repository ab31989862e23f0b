use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "alchemy-server", version, about = "Serves the alchemy board locally.")]
pub struct Config {
    /// Address the game page and API listen on.
    #[arg(long, env = "ALCHEMY_ADDR", default_value = "127.0.0.1:39333")]
    pub addr: SocketAddr,

    /// Base URL of the fusion service (without the trailing `/fusion`).
    #[arg(long, env = "ALCHEMY_FUSION_URL", default_value = alchemy_engine::fusion::DEFAULT_BASE_URL)]
    pub fusion_url: String,

    #[arg(
        long,
        env = "ALCHEMY_FUSION_TIMEOUT_SECS",
        default_value_t = alchemy_engine::fusion::DEFAULT_TIMEOUT.as_secs()
    )]
    pub fusion_timeout_secs: u64,
}

impl Config {
    pub fn fusion_timeout(&self) -> Duration {
        Duration::from_secs(self.fusion_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::try_parse_from(["alchemy-server"]).unwrap();
        assert_eq!(c.addr.port(), 39333);
        assert!(c.addr.ip().is_loopback());
        assert_eq!(c.fusion_url, "https://redalchemy.redriottank.com/api");
        assert_eq!(c.fusion_timeout(), alchemy_engine::fusion::DEFAULT_TIMEOUT);
    }

    #[test]
    fn flags_override_defaults() {
        let c = Config::try_parse_from([
            "alchemy-server",
            "--addr",
            "127.0.0.1:8080",
            "--fusion-url",
            "http://localhost:9000/api",
            "--fusion-timeout-secs",
            "3",
        ])
        .unwrap();
        assert_eq!(c.addr.port(), 8080);
        assert_eq!(c.fusion_url, "http://localhost:9000/api");
        assert_eq!(c.fusion_timeout(), Duration::from_secs(3));
    }
}
