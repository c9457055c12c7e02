//! Serde helpers for configuration durations
//!
//! Durations are written as whole seconds, which reads better in TOML.

/// `Duration` as seconds (u64)
pub mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize a Duration as seconds (u64)
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    /// Deserialize a Duration from seconds (u64)
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// `Option<Duration>` as optional seconds; absent means no limit
pub mod option_duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Timeouts {
        #[serde(with = "duration_secs")]
        connect: Duration,
        #[serde(default, with = "option_duration_secs", skip_serializing_if = "Option::is_none")]
        command: Option<Duration>,
    }

    #[test]
    fn test_duration_secs_serialize() {
        let t = Timeouts {
            connect: Duration::from_secs(3),
            command: None,
        };
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"connect":3}"#);
    }

    #[test]
    fn test_option_duration_secs_deserialize() {
        let t: Timeouts = serde_json::from_str(r#"{"connect":3,"command":20}"#).unwrap();
        assert_eq!(t.command, Some(Duration::from_secs(20)));

        let t: Timeouts = serde_json::from_str(r#"{"connect":3}"#).unwrap();
        assert_eq!(t.command, None);
    }
}
