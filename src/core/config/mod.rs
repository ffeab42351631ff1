use serde::Deserialize;
use std::collections::HashMap;

/// A default setup to extract configuration from environment variables.
///
/// The default setup uses `__` (double underscore) as a delimiter.
///
/// ```
/// use rbns_sdk::client::ConnectionConfig;
/// use rbns_sdk::core::config::ConfigFromEnv;
///
/// fn run() -> Result<(), config::ConfigError> {
///     /*
///     Assume the following env-vars are set:
///         RBNS__ENDPOINT = rbns.example.com:6565
///         RBNS__API_KEY = my-api-key
///         RBNS__TIMEOUT = 5s
///     */
///     let config = ConnectionConfig::from_env_prefix("RBNS")?;
///
///     Ok(())
/// }
/// ```
pub trait ConfigFromEnv<'de>: Sized + Deserialize<'de> {
    /// Get a configuration from the env-vars.
    fn from_env() -> Result<Self, config::ConfigError> {
        Self::from(config::Environment::default())
    }

    /// Get a configuration from the env-vars, prefixing all with the provided prefix **plus**
    /// the separator.
    fn from_env_prefix<S: AsRef<str>>(prefix: S) -> Result<Self, config::ConfigError> {
        Self::from(config::Environment::with_prefix(prefix.as_ref()))
    }

    fn from(env: config::Environment) -> Result<Self, config::ConfigError>;

    fn from_set<K, V>(set: HashMap<K, V>) -> Result<Self, config::ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let set = set.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self::from(config::Environment::default().source(Some(set)))
    }
}

impl<'de, T: Deserialize<'de> + Sized> ConfigFromEnv<'de> for T {
    fn from(env: config::Environment) -> Result<T, config::ConfigError> {
        let env = env.try_parsing(true).separator("__");

        let cfg = config::Config::builder().add_source(env);
        cfg.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use config::Environment;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[test]
    fn test_prefix() {
        #[derive(Debug, Deserialize)]
        struct Remote {
            pub endpoint: String,
            pub insecure: bool,
        }

        let mut env = HashMap::<String, String>::new();
        env.insert("RBNS__ENDPOINT".into(), "rbns:6565".into());
        env.insert("RBNS__INSECURE".into(), "true".into());

        let remote =
            <Remote as ConfigFromEnv>::from(Environment::with_prefix("RBNS").source(Some(env)))
                .unwrap();
        assert_eq!(remote.endpoint, "rbns:6565");
        assert!(remote.insecure);
    }

    #[test]
    fn test_nested() {
        #[derive(Debug, Deserialize)]
        struct Settings {
            #[serde(default)]
            pub remote: Option<Remote>,
        }
        #[derive(Debug, Deserialize)]
        struct Remote {
            pub endpoint: String,
        }

        let mut env = HashMap::<String, String>::new();
        env.insert("APP__REMOTE__ENDPOINT".into(), "rbns:6565".into());

        let settings = <Settings as ConfigFromEnv>::from(
            Environment::default().prefix("APP").source(Some(env)),
        )
        .unwrap();

        assert_eq!(settings.remote.unwrap().endpoint, "rbns:6565");
    }
}
