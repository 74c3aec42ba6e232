use std::{
    env, fmt,
    net::{AddrParseError, Ipv4Addr, SocketAddr, SocketAddrV4},
};

use api::RunDefaults;
use portfolio::{PortfolioCaps, SimConfig, DEFAULT_INITIAL_CAPITAL};
use sizing::DEFAULT_KELLY_CAP;

const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8080));

const ENV_ADDR: &str = "LAB_SERVER_ADDR";
const ENV_INITIAL_CAPITAL: &str = "LAB_INITIAL_CAPITAL";
const ENV_GLOBAL_CAP: &str = "LAB_GLOBAL_CAP";
const ENV_INSTRUMENT_CAP: &str = "LAB_INSTRUMENT_CAP";
const ENV_CLUSTER_CAP: &str = "LAB_CLUSTER_CAP";
const ENV_KELLY_CAP: &str = "LAB_KELLY_CAP";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub initial_capital: f64,
    pub caps: PortfolioCaps,
    pub kelly_cap: f64,
}

impl Config {
    pub fn run_defaults(&self) -> RunDefaults {
        RunDefaults::new(
            SimConfig {
                initial_capital: self.initial_capital,
                caps: self.caps,
            },
            self.kelly_cap,
        )
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidListenAddr(AddrParseError),
    InvalidInitialCapital,
    InvalidGlobalCap,
    InvalidInstrumentCap,
    InvalidClusterCap,
    InvalidKellyCap,
    NonUnicode(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidListenAddr(err) => {
                write!(f, "{ENV_ADDR} is not a valid socket address: {err}")
            }
            Self::InvalidInitialCapital => {
                write!(f, "{ENV_INITIAL_CAPITAL} must be a finite positive amount")
            }
            Self::InvalidGlobalCap => {
                write!(f, "{ENV_GLOBAL_CAP} must be a finite non-negative fraction")
            }
            Self::InvalidInstrumentCap => {
                write!(f, "{ENV_INSTRUMENT_CAP} must be a finite non-negative fraction")
            }
            Self::InvalidClusterCap => {
                write!(f, "{ENV_CLUSTER_CAP} must be a finite non-negative fraction")
            }
            Self::InvalidKellyCap => {
                write!(f, "{ENV_KELLY_CAP} must be a fraction between 0 and 1")
            }
            Self::NonUnicode(key) => write!(f, "{key} contains non-unicode data"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidListenAddr(err) => Some(err),
            _ => None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match env::var(ENV_ADDR) {
            Ok(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            Err(env::VarError::NotPresent) => DEFAULT_LISTEN_ADDR,
            Err(env::VarError::NotUnicode(_)) => return Err(ConfigError::NonUnicode(ENV_ADDR)),
        };

        let initial_capital = parse_f64_env(
            ENV_INITIAL_CAPITAL,
            DEFAULT_INITIAL_CAPITAL,
            |value| value > 0.0,
            ConfigError::InvalidInitialCapital,
        )?;

        let defaults = PortfolioCaps::default();
        let caps = PortfolioCaps {
            global_cap: parse_f64_env(
                ENV_GLOBAL_CAP,
                defaults.global_cap,
                |value| value >= 0.0,
                ConfigError::InvalidGlobalCap,
            )?,
            per_instrument_cap: parse_f64_env(
                ENV_INSTRUMENT_CAP,
                defaults.per_instrument_cap,
                |value| value >= 0.0,
                ConfigError::InvalidInstrumentCap,
            )?,
            per_cluster_cap: parse_f64_env(
                ENV_CLUSTER_CAP,
                defaults.per_cluster_cap,
                |value| value >= 0.0,
                ConfigError::InvalidClusterCap,
            )?,
        };

        let kelly_cap = parse_f64_env(
            ENV_KELLY_CAP,
            DEFAULT_KELLY_CAP,
            |value| (0.0..=1.0).contains(&value),
            ConfigError::InvalidKellyCap,
        )?;

        Ok(Self {
            listen_addr,
            initial_capital,
            caps,
            kelly_cap,
        })
    }
}

/// Reads `key` as a finite `f64` accepted by `valid`, falling back to
/// `default_value` when unset.
fn parse_f64_env(
    key: &'static str,
    default_value: f64,
    valid: impl Fn(f64) -> bool,
    invalid_error: ConfigError,
) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() && valid(parsed) => Ok(parsed),
            _ => Err(invalid_error),
        },
        Err(env::VarError::NotPresent) => Ok(default_value),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode(key)),
    }
}

#[cfg(test)]
mod tests {
    use std::{env, sync::Mutex};

    use super::{Config, ConfigError};

    static ENV_LOCK: Mutex<()> = Mutex::new(());
    const ENV_KEYS: [&str; 6] = [
        "LAB_SERVER_ADDR",
        "LAB_INITIAL_CAPITAL",
        "LAB_GLOBAL_CAP",
        "LAB_INSTRUMENT_CAP",
        "LAB_CLUSTER_CAP",
        "LAB_KELLY_CAP",
    ];

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<std::ffi::OsString>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn unset(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }

        #[cfg(unix)]
        fn set_os(key: &'static str, value: std::ffi::OsString) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.take() {
                Some(value) => env::set_var(self.key, value),
                None => env::remove_var(self.key),
            }
        }
    }

    fn reset_config_env_baseline() -> Vec<EnvVarGuard> {
        ENV_KEYS.into_iter().map(EnvVarGuard::unset).collect()
    }

    #[test]
    fn defaults_when_env_is_unset() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();

        let config = Config::from_env().unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.initial_capital, 100_000.0);
        assert_eq!(config.caps.global_cap, 1.0);
        assert_eq!(config.caps.per_instrument_cap, 0.3);
        assert_eq!(config.caps.per_cluster_cap, 0.6);
        assert_eq!(config.kelly_cap, 0.2);
    }

    #[test]
    fn uses_overrides_from_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _addr = EnvVarGuard::set("LAB_SERVER_ADDR", "127.0.0.1:9090");
        let _capital = EnvVarGuard::set("LAB_INITIAL_CAPITAL", "25000");
        let _cluster = EnvVarGuard::set("LAB_CLUSTER_CAP", " 0.05 ");
        let _kelly = EnvVarGuard::set("LAB_KELLY_CAP", "0.03");

        let config = Config::from_env().unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.initial_capital, 25_000.0);
        assert_eq!(config.caps.per_cluster_cap, 0.05);
        assert_eq!(config.kelly_cap, 0.03);
    }

    #[test]
    fn caps_above_one_are_accepted() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set("LAB_GLOBAL_CAP", "1.5");

        let config = Config::from_env().unwrap();

        assert_eq!(config.caps.global_cap, 1.5);
    }

    #[test]
    fn run_defaults_carry_configured_values() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set("LAB_INSTRUMENT_CAP", "0.1");

        let defaults = Config::from_env().unwrap().run_defaults();

        assert_eq!(defaults.config.caps.per_instrument_cap, 0.1);
        assert_eq!(defaults.config.initial_capital, 100_000.0);
        assert!(defaults.profile.build().is_ok());
    }

    #[test]
    fn returns_error_for_invalid_listen_address_override() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set("LAB_SERVER_ADDR", "not-an-addr");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidListenAddr(_)));
    }

    #[test]
    fn returns_error_for_non_positive_initial_capital() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();

        for value in ["0", "-10", "NaN", "inf", "lots"] {
            let _guard = EnvVarGuard::set("LAB_INITIAL_CAPITAL", value);

            let err = Config::from_env().unwrap_err();

            assert!(matches!(err, ConfigError::InvalidInitialCapital), "{value}");
        }
    }

    #[test]
    fn returns_error_for_negative_cap() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set("LAB_CLUSTER_CAP", "-0.1");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidClusterCap));
    }

    #[test]
    fn returns_error_for_kelly_cap_above_one() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set("LAB_KELLY_CAP", "1.2");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidKellyCap));
        assert_eq!(
            err.to_string(),
            "LAB_KELLY_CAP must be a fraction between 0 and 1"
        );
    }

    #[cfg(unix)]
    #[test]
    fn returns_error_for_non_unicode_env_var() {
        use std::os::unix::ffi::OsStringExt;

        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set_os(
            "LAB_GLOBAL_CAP",
            std::ffi::OsString::from_vec(vec![0x66, 0x6f, 0x80]),
        );

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::NonUnicode("LAB_GLOBAL_CAP")));
    }
}
