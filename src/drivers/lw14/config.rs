//! Node configuration as supplied by the host.
//!
//! The host delivers a JSON node definition where numeric settings may be
//! either numbers or strings. [`NodeConfig::settings`] validates it into the
//! values used for each invocation.

use super::defs::DEFAULT_I2C_ADDRESS;
use crate::base::address::{AddressError, AddressingMode, OperationKind, Target};
use crate::drivers::i2c::bus::MAX_DEVICE_ADDRESS;
use core::str::FromStr;
use log::warn;
use serde_derive::Deserialize;
use std::error::Error;
use std::fmt;

pub const DEFAULT_BUSNO: u32 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    Dacp,
    Command,
    Scene,
    Query,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Dacp => OperationKind::Dacp,
            Operation::Command | Operation::Scene | Operation::Query => OperationKind::Command,
        }
    }

    /// Name the node type is registered under in the host
    pub fn type_name(&self) -> &'static str {
        match self {
            Operation::Dacp => "lw14 dacp",
            Operation::Command => "lw14 cmd",
            Operation::Scene => "lw14 scene",
            Operation::Query => "lw14 query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for Operation {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.strip_prefix("lw14 ").unwrap_or(s.as_str()) {
            "dacp" | "dapc" => Ok(Operation::Dacp),
            "cmd" | "command" => Ok(Operation::Command),
            "scene" => Ok(Operation::Scene),
            "query" => Ok(Operation::Query),
            _ => Err(ConfigError::Invalid {
                field: "operation",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Missing(&'static str),
    Invalid { field: &'static str, value: String },
    Address(AddressError),
}

impl Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> ConfigError {
        ConfigError::Json(err)
    }
}

impl From<AddressError> for ConfigError {
    fn from(err: AddressError) -> ConfigError {
        ConfigError::Address(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(err) => write!(f, "{}", err),
            ConfigError::Missing(field) => write!(f, "Missing {}", field),
            ConfigError::Invalid { field, value } => {
                write!(f, "Invalid value for {}: {}", field, value)
            }
            ConfigError::Address(err) => write!(f, "{}", err),
        }
    }
}

/// Setting that may arrive as a JSON number or string.
///
/// Any other JSON value is kept as `Other` and treated as invalid by the
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl ConfigValue {
    fn integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            ConfigValue::Text(s) => i64::from_str(s.trim()).ok(),
            ConfigValue::Other(_) => None,
        }
    }

    fn text(&self) -> String {
        match self {
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::Text(s) => s.trim().to_string(),
            ConfigValue::Other(v) => v.to_string(),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Number(n)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// I2C bus number
    #[serde(default)]
    pub busno: Option<ConfigValue>,
    /// I2C device address, hex
    #[serde(default)]
    pub address: Option<ConfigValue>,
    /// 0 = broadcast, 1 = group, 2 = short
    #[serde(default)]
    pub dali_type: Option<ConfigValue>,
    /// Device or group number 0..63
    #[serde(default)]
    pub dali_adr: Option<ConfigValue>,
    /// Level, opcode or query code
    #[serde(default)]
    pub dali_value: Option<ConfigValue>,
}

/// Validated node settings
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Settings {
    pub busno: u32,
    pub device: u8,
    pub mode: AddressingMode,
    pub target: Target,
    pub value: u8,
}

impl NodeConfig {
    pub fn from_json(json: &str) -> Result<NodeConfig, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn busno(&self) -> u32 {
        match &self.busno {
            None => DEFAULT_BUSNO,
            Some(v) => match v.integer().and_then(|n| u32::try_from(n).ok()) {
                Some(n) => n,
                None => {
                    warn!("Invalid bus number {:?}, using {}", v, DEFAULT_BUSNO);
                    DEFAULT_BUSNO
                }
            },
        }
    }

    pub fn device(&self) -> Result<u8, ConfigError> {
        let Some(v) = &self.address else {
            return Ok(DEFAULT_I2C_ADDRESS);
        };
        let text = v.text();
        let hex = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text.as_str());
        match u8::from_str_radix(hex, 16) {
            Ok(a) if a <= MAX_DEVICE_ADDRESS => Ok(a),
            _ => Err(ConfigError::Invalid {
                field: "address",
                value: text,
            }),
        }
    }

    pub fn mode(&self) -> Result<AddressingMode, ConfigError> {
        let v = self.dali_type.as_ref().ok_or(ConfigError::Missing("dali_type"))?;
        AddressingMode::from_str(&v.text()).map_err(|_| ConfigError::Invalid {
            field: "dali_type",
            value: v.text(),
        })
    }

    pub fn target(&self) -> Result<Target, ConfigError> {
        let v = self.dali_adr.as_ref().ok_or(ConfigError::Missing("dali_adr"))?;
        match v.integer() {
            Some(n) => Ok(Target::new(n)?),
            None => Err(ConfigError::Invalid {
                field: "dali_adr",
                value: v.text(),
            }),
        }
    }

    pub fn value(&self) -> Result<u8, ConfigError> {
        let v = self
            .dali_value
            .as_ref()
            .ok_or(ConfigError::Missing("dali_value"))?;
        v.integer()
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| ConfigError::Invalid {
                field: "dali_value",
                value: v.text(),
            })
    }

    /// Validate the settings used by an `op` node.
    ///
    /// Queries always address a single device, so `dali_type` is ignored for
    /// them. Broadcasts ignore `dali_adr`.
    pub fn settings(&self, op: Operation) -> Result<Settings, ConfigError> {
        let mode = if op == Operation::Query {
            AddressingMode::Short
        } else {
            self.mode()?
        };
        let target = match mode {
            AddressingMode::Broadcast => Target::new(0u8)?,
            AddressingMode::Group | AddressingMode::Short => self.target()?,
        };
        Ok(Settings {
            busno: self.busno(),
            device: self.device()?,
            mode,
            target,
            value: self.value()?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn host_strings() {
        let config = NodeConfig::from_json(
            r#"{
                "name": "Hall",
                "busno": "1",
                "address": "23",
                "dali_type": "1",
                "dali_adr": "5",
                "dali_value": "80"
            }"#,
        )
        .unwrap();
        assert_eq!(config.name.as_deref(), Some("Hall"));
        let settings = config.settings(Operation::Dacp).unwrap();
        assert_eq!(
            settings,
            Settings {
                busno: 1,
                device: 0x23,
                mode: AddressingMode::Group,
                target: Target::new(5u8).unwrap(),
                value: 80
            }
        );
    }

    #[test]
    fn numbers_accepted() {
        let config = NodeConfig::from_json(
            r#"{"busno": 3, "address": 24, "dali_type": 2, "dali_adr": 63, "dali_value": 5}"#,
        )
        .unwrap();
        let settings = config.settings(Operation::Command).unwrap();
        assert_eq!(settings.busno, 3);
        // Address is always hex
        assert_eq!(settings.device, 0x24);
        assert_eq!(settings.mode, AddressingMode::Short);
        assert_eq!(settings.target.value(), 63);
    }

    #[test]
    fn busno_defaults() {
        let mut config = NodeConfig::default();
        assert_eq!(config.busno(), 1);
        config.busno = Some("abc".into());
        assert_eq!(config.busno(), 1);
        config.busno = Some(ConfigValue::Number(-2));
        assert_eq!(config.busno(), 1);
        config.busno = Some("4".into());
        assert_eq!(config.busno(), 4);
        for busno in ["1.5", "true", "null", r#"{"bus": 2}"#, "[3]"] {
            let json = format!(r#"{{"busno": {}, "dali_type": 0, "dali_value": 0}}"#, busno);
            let config = NodeConfig::from_json(&json).unwrap();
            assert_eq!(config.busno(), DEFAULT_BUSNO, "busno {}", busno);
        }
        let config = NodeConfig::from_json(r#"{"busno": 2.5, "dali_type": 0, "dali_value": 0}"#)
            .unwrap();
        assert_eq!(config.settings(Operation::Dacp).unwrap().busno, DEFAULT_BUSNO);
    }

    #[test]
    fn non_integer_values_rejected() {
        let config = NodeConfig::from_json(r#"{"dali_type": 0, "dali_value": 1.5}"#).unwrap();
        assert!(matches!(
            config.value(),
            Err(ConfigError::Invalid {
                field: "dali_value",
                ..
            })
        ));
        let config = NodeConfig::from_json(r#"{"dali_type": true, "dali_value": 0}"#).unwrap();
        assert!(matches!(
            config.mode(),
            Err(ConfigError::Invalid {
                field: "dali_type",
                ..
            })
        ));
    }

    #[test]
    fn device_address() {
        let mut config = NodeConfig::default();
        assert_eq!(config.device().unwrap(), DEFAULT_I2C_ADDRESS);
        config.address = Some("0x3f".into());
        assert_eq!(config.device().unwrap(), 0x3f);
        config.address = Some("80".into());
        assert!(matches!(
            config.device(),
            Err(ConfigError::Invalid {
                field: "address",
                ..
            })
        ));
        config.address = Some("zz".into());
        assert!(config.device().is_err());
    }

    #[test]
    fn target_validated() {
        let config = NodeConfig {
            dali_type: Some("2".into()),
            dali_adr: Some("64".into()),
            dali_value: Some("5".into()),
            ..NodeConfig::default()
        };
        assert!(matches!(
            config.settings(Operation::Command),
            Err(ConfigError::Address(AddressError::InvalidAddress))
        ));
        // Broadcast doesn't care
        let config = NodeConfig {
            dali_type: Some("0".into()),
            ..config
        };
        let settings = config.settings(Operation::Command).unwrap();
        assert_eq!(settings.mode, AddressingMode::Broadcast);
        assert_eq!(settings.target.value(), 0);
    }

    #[test]
    fn query_ignores_type() {
        let config = NodeConfig {
            dali_type: Some("0".into()),
            dali_adr: Some("3".into()),
            dali_value: Some("144".into()),
            ..NodeConfig::default()
        };
        let settings = config.settings(Operation::Query).unwrap();
        assert_eq!(settings.mode, AddressingMode::Short);
        assert_eq!(settings.target.value(), 3);
        assert_eq!(settings.value, 144);

        let config = NodeConfig {
            dali_type: None,
            ..config
        };
        assert!(config.settings(Operation::Query).is_ok());
        assert!(matches!(
            config.settings(Operation::Scene),
            Err(ConfigError::Missing("dali_type"))
        ));
    }

    #[test]
    fn value_range() {
        let mut config = NodeConfig {
            dali_type: Some("0".into()),
            ..NodeConfig::default()
        };
        assert!(matches!(
            config.settings(Operation::Dacp),
            Err(ConfigError::Missing("dali_value"))
        ));
        config.dali_value = Some("256".into());
        assert!(config.settings(Operation::Dacp).is_err());
        config.dali_value = Some("255".into());
        assert_eq!(config.settings(Operation::Dacp).unwrap().value, 255);
    }

    #[test]
    fn operation_names() {
        assert_eq!("lw14 dacp".parse::<Operation>().unwrap(), Operation::Dacp);
        assert_eq!("cmd".parse::<Operation>().unwrap(), Operation::Command);
        assert_eq!("Scene".parse::<Operation>().unwrap(), Operation::Scene);
        assert_eq!("lw14 query".parse::<Operation>().unwrap(), Operation::Query);
        assert!("light".parse::<Operation>().is_err());
        assert_eq!(Operation::Scene.kind(), OperationKind::Command);
        assert_eq!(Operation::Dacp.kind(), OperationKind::Dacp);
    }
}
