use std::collections::BTreeMap;
use std::path::Path;

use ini::Ini;

use crate::{Error, Result};

/// Configuration file read by [`Pool::instance`](crate::Pool::instance) when
/// no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "db_config.ini";

/// A typed key/value view over an on-disk configuration file.
///
/// The backend is chosen by file extension: `.ini` files are read from their
/// default (unnamed) section, `.yaml`/`.yml` files from the top-level mapping.
/// The choice is fixed at load time; an unsupported extension or a file that
/// fails to parse is a fatal error, there is no fallback format.
///
/// Lookups never fail: a missing key or a value that cannot be coerced to the
/// requested type yields the caller-supplied default.
#[derive(Debug)]
pub struct Config {
    values: BTreeMap<String, String>,
}

impl Config {
    /// Load a configuration file, selecting the parser by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "ini" => Self::load_ini(path),
            "yaml" | "yml" => Self::load_yaml(path),
            _ => Err(Error::Config(format!(
                "unsupported config format for {}; expected .ini, .yaml or .yml",
                path.display()
            ))),
        }
    }

    fn load_ini(path: &Path) -> Result<Self> {
        let ini = Ini::load_from_file(path)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;

        let mut values = BTreeMap::new();
        if let Some(props) = ini.section(None::<String>) {
            for (key, value) in props.iter() {
                values.insert(key.to_owned(), value.to_owned());
            }
        }
        Ok(Self { values })
    }

    fn load_yaml(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let doc: serde_yaml::Value = serde_yaml::from_str(&text)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;

        let mut values = BTreeMap::new();
        if let serde_yaml::Value::Mapping(mapping) = doc {
            for (key, value) in mapping {
                let Some(key) = key.as_str() else { continue };
                let value = match value {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    // nested structures have no place in a flat key space
                    _ => continue,
                };
                values.insert(key.to_owned(), value);
            }
        }
        Ok(Self { values })
    }

    /// Look up a string value, or `default` if the key is absent.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_owned())
    }

    /// Look up an integer value, or `default` if the key is absent or does
    /// not parse as an integer.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values
            .get(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Look up a boolean value, or `default` if the key is absent or not one
    /// of `true/false`, `yes/no`, `on/off`, `1/0` (case-insensitive).
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let value = self.values.get(key).map(|v| v.trim().to_ascii_lowercase());
        match value.as_deref() {
            Some("true" | "yes" | "on" | "1") => true,
            Some("false" | "no" | "off" | "0") => false,
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        Config {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = config(&[]);
        assert_eq!(config.get_string("ip", "localhost"), "localhost");
        assert_eq!(config.get_int("port", 3306), 3306);
        assert!(config.get_bool("flag", true));
    }

    #[test]
    fn coercion_failures_fall_back_to_defaults() {
        let config = config(&[("port", "not-a-number"), ("flag", "maybe")]);
        assert_eq!(config.get_int("port", 3306), 3306);
        assert!(!config.get_bool("flag", false));
    }

    #[test]
    fn bool_coercion_accepts_common_spellings() {
        let config = config(&[("a", "Yes"), ("b", "off"), ("c", "1"), ("d", "FALSE")]);
        assert!(config.get_bool("a", false));
        assert!(!config.get_bool("b", true));
        assert!(config.get_bool("c", false));
        assert!(!config.get_bool("d", true));
    }

    #[test]
    fn int_values_are_trimmed_before_parsing() {
        let config = config(&[("initSize", " 7 ")]);
        assert_eq!(config.get_int("initSize", 5), 7);
    }
}
