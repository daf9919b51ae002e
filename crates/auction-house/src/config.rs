//! Auction house configuration.
//!
//! [`HouseConfig`] is read from an optional TOML file, then overridden by
//! `AUCTION__*` environment variables (`AUCTION__RPC_PORT=9000`,
//! `AUCTION__GOVERNANCE=0x...`). Every field has a default, so an empty file
//! is valid apart from the governance and want-token addresses, which must be
//! set before [`HouseConfig::validate`] passes.
//!
//! U256 values are written as decimal strings since TOML integers stop at 64
//! bits.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use auction_core::constants::{
    bps_to_ray, BPS_PRECISION, DEFAULT_AUCTION_LENGTH, DEFAULT_DECAY_RATE_BPS, DEFAULT_RPC_PORT,
    DEFAULT_STARTING_PRICE, DEFAULT_UPDATE_INTERVAL, DEFAULT_WANT_DECIMALS, WAD,
};
use auction_core::error::ParameterError;
use auction_core::types::{AuctionParams, TokenSpec};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "AUCTION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error(transparent)]
    Invalid(#[from] ParameterError),
}

/// A from-token listed in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromTokenConfig {
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseConfig {
    /// IP address for the JSON-RPC server to bind to.
    pub rpc_bind: String,
    /// Port for the JSON-RPC server.
    pub rpc_port: u16,
    /// Log filter (e.g. "info", "auction_house=debug").
    pub log_level: String,
    /// "text" or "json".
    pub log_format: String,
    /// Initial governance address.
    pub governance: String,
    /// Address of the token takers pay in.
    pub want_token: String,
    pub want_decimals: u8,
    /// Decay per update interval in basis points.
    pub decay_rate_bps: u64,
    /// Seconds per price step.
    pub update_interval: u64,
    /// Maximum round duration in seconds.
    pub auction_length: u64,
    /// Starting price in whole want tokens per whole from token.
    pub starting_price: String,
    /// From-tokens enabled at startup.
    pub from_tokens: Vec<FromTokenConfig>,
}

impl Default for HouseConfig {
    fn default() -> Self {
        Self {
            rpc_bind: "127.0.0.1".to_string(),
            rpc_port: DEFAULT_RPC_PORT,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            governance: String::new(),
            want_token: String::new(),
            want_decimals: DEFAULT_WANT_DECIMALS,
            decay_rate_bps: DEFAULT_DECAY_RATE_BPS,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            auction_length: DEFAULT_AUCTION_LENGTH,
            starting_price: DEFAULT_STARTING_PRICE.to_string(),
            from_tokens: Vec::new(),
        }
    }
}

impl HouseConfig {
    /// Load from `path` (if any) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Conventional location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("auction-house")
            .join("config.toml")
    }

    /// Socket address string for the RPC server.
    pub fn rpc_addr(&self) -> String {
        format!("{}:{}", self.rpc_bind, self.rpc_port)
    }

    pub fn governance_address(&self) -> Result<Address, ParameterError> {
        let address = parse_address("governance", &self.governance)?;
        if address.is_zero() {
            return Err(ParameterError::ZeroAddress);
        }
        Ok(address)
    }

    pub fn want(&self) -> Result<TokenSpec, ParameterError> {
        TokenSpec::new(parse_address("want_token", &self.want_token)?, self.want_decimals)
    }

    pub fn params(&self) -> Result<AuctionParams, ParameterError> {
        if self.decay_rate_bps > BPS_PRECISION {
            return Err(ParameterError::DecayRateTooHigh(bps_to_ray(self.decay_rate_bps)));
        }
        let whole = U256::from_str(self.starting_price.trim()).map_err(|e| ParameterError::Invalid {
            field: "starting_price",
            reason: e.to_string(),
        })?;
        let starting_price = whole.checked_mul(WAD).ok_or_else(|| ParameterError::Invalid {
            field: "starting_price",
            reason: "too large".to_string(),
        })?;
        let params = AuctionParams {
            decay_rate: bps_to_ray(self.decay_rate_bps),
            update_interval: self.update_interval,
            auction_length: self.auction_length,
            starting_price,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn from_token_specs(&self) -> Result<Vec<TokenSpec>, ParameterError> {
        self.from_tokens
            .iter()
            .map(|token| {
                TokenSpec::new(parse_address("from_tokens", &token.address)?, token.decimals)
            })
            .collect()
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.log_format != "text" && self.log_format != "json" {
            return Err(ParameterError::Invalid {
                field: "log_format",
                reason: format!("expected \"text\" or \"json\", got {:?}", self.log_format),
            });
        }
        self.governance_address()?;
        let want = self.want()?;
        self.params()?;
        let mut seen = Vec::with_capacity(self.from_tokens.len());
        for token in self.from_token_specs()? {
            if token.address == want.address {
                return Err(ParameterError::WantTokenAsFrom(token.address));
            }
            if seen.contains(&token.address) {
                return Err(ParameterError::AlreadyEnabled(token.address));
            }
            seen.push(token.address);
        }
        Ok(())
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ParameterError> {
    Address::from_str(value.trim()).map_err(|e| ParameterError::Invalid {
        field,
        reason: format!("{value:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const GOV: &str = "0x1111111111111111111111111111111111111111";
    const WANT: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
    const FROM: &str = "0xf0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0";

    /// Serializes tests that touch `AUCTION__*` variables or call `load`.
    static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

    /// Sets environment variables for one test and restores them on drop.
    struct EnvGuard {
        prev: Vec<(&'static str, Option<String>)>,
        _lock: parking_lot::MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        fn lock() -> Self {
            Self::set(&[])
        }

        fn set(vars: &[(&'static str, &str)]) -> Self {
            let lock = ENV_LOCK.lock();
            let mut prev = Vec::with_capacity(vars.len());
            for (key, value) in vars {
                prev.push((*key, std::env::var(key).ok()));
                // SAFETY: every test touching the environment holds ENV_LOCK.
                unsafe { std::env::set_var(key, value) };
            }
            Self { prev, _lock: lock }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, prev) in self.prev.drain(..) {
                // SAFETY: ENV_LOCK is still held.
                match prev {
                    Some(prev) => unsafe { std::env::set_var(key, prev) },
                    None => unsafe { std::env::remove_var(key) },
                }
            }
        }
    }

    fn valid() -> HouseConfig {
        HouseConfig {
            governance: GOV.to_string(),
            want_token: WANT.to_string(),
            from_tokens: vec![FromTokenConfig { address: FROM.to_string(), decimals: 6 }],
            ..HouseConfig::default()
        }
    }

    #[test]
    fn defaults() {
        let cfg = HouseConfig::default();
        assert_eq!(cfg.rpc_port, DEFAULT_RPC_PORT);
        assert_eq!(cfg.rpc_bind, "127.0.0.1");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.rpc_addr(), format!("127.0.0.1:{DEFAULT_RPC_PORT}"));
        assert_eq!(cfg.params().unwrap(), AuctionParams::default());
    }

    #[test]
    fn default_requires_addresses() {
        assert!(matches!(
            HouseConfig::default().validate(),
            Err(ParameterError::Invalid { field: "governance", .. })
        ));
    }

    #[test]
    fn valid_config_passes() {
        let cfg = valid();
        cfg.validate().unwrap();
        assert_eq!(cfg.governance_address().unwrap(), Address::repeat_byte(0x11));
        assert_eq!(cfg.want().unwrap().address, Address::repeat_byte(0xEE));
        let tokens = cfg.from_token_specs().unwrap();
        assert_eq!(tokens, vec![TokenSpec { address: Address::repeat_byte(0xF0), decimals: 6 }]);
    }

    #[test]
    fn rejects_want_token_as_from() {
        let mut cfg = valid();
        cfg.from_tokens.push(FromTokenConfig { address: WANT.to_string(), decimals: 18 });
        assert_eq!(cfg.validate(), Err(ParameterError::WantTokenAsFrom(Address::repeat_byte(0xEE))));
    }

    #[test]
    fn rejects_duplicate_from_token() {
        let mut cfg = valid();
        cfg.from_tokens.push(FromTokenConfig { address: FROM.to_string(), decimals: 6 });
        assert_eq!(cfg.validate(), Err(ParameterError::AlreadyEnabled(Address::repeat_byte(0xF0))));
    }

    #[test]
    fn rejects_bad_parameters() {
        let cfg = HouseConfig { decay_rate_bps: BPS_PRECISION + 1, ..valid() };
        assert!(matches!(cfg.validate(), Err(ParameterError::DecayRateTooHigh(_))));

        let cfg = HouseConfig { update_interval: 0, ..valid() };
        assert_eq!(cfg.validate(), Err(ParameterError::ZeroUpdateInterval));

        let cfg = HouseConfig { starting_price: "abc".to_string(), ..valid() };
        assert!(matches!(cfg.validate(), Err(ParameterError::Invalid { field: "starting_price", .. })));

        let cfg = HouseConfig { log_format: "xml".to_string(), ..valid() };
        assert!(matches!(cfg.validate(), Err(ParameterError::Invalid { field: "log_format", .. })));
    }

    #[test]
    fn starting_price_is_wad_scaled() {
        let cfg = HouseConfig { starting_price: "1000".to_string(), ..valid() };
        assert_eq!(cfg.params().unwrap().starting_price, U256::from(1_000u64) * WAD);
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
rpc_port = 9100
governance = "{GOV}"
want_token = "{WANT}"
want_decimals = 6
decay_rate_bps = 100
update_interval = 60
auction_length = 3600
starting_price = "1000"

[[from_tokens]]
address = "{FROM}"
decimals = 18
"#
        )
        .unwrap();

        let cfg = {
            let _env = EnvGuard::lock();
            HouseConfig::load(Some(file.path())).unwrap()
        };
        cfg.validate().unwrap();
        assert_eq!(cfg.rpc_port, 9100);
        assert_eq!(cfg.want_decimals, 6);
        assert_eq!(cfg.log_level, "info");
        let params = cfg.params().unwrap();
        assert_eq!(params.decay_rate, bps_to_ray(100));
        assert_eq!(params.auction_length, 3_600);
        assert_eq!(cfg.from_token_specs().unwrap().len(), 1);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let _env = EnvGuard::lock();
        assert!(matches!(HouseConfig::load(Some(&missing)), Err(ConfigError::Load(_))));
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "rpc_bind = \"127.0.0.1\"\nrpc_port = 9100\n").unwrap();

        let before = std::env::var("AUCTION__RPC_BIND").ok();
        let cfg = {
            let _env = EnvGuard::set(&[
                ("AUCTION__RPC_BIND", "0.0.0.0"),
                ("AUCTION__DECAY_RATE_BPS", "250"),
            ]);
            HouseConfig::load(Some(file.path())).unwrap()
        };
        assert_eq!(cfg.rpc_bind, "0.0.0.0");
        assert_eq!(cfg.rpc_port, 9100);
        assert_eq!(cfg.decay_rate_bps, 250);
        assert_eq!(cfg.rpc_addr(), "0.0.0.0:9100");
        assert_eq!(std::env::var("AUCTION__RPC_BIND").ok(), before);
    }

    #[test]
    fn default_path_ends_with_config_toml() {
        assert!(HouseConfig::default_path().ends_with("auction-house/config.toml"));
    }
}
