// ── Backend wire quirks ──
//
// The backend writes a nil list as `null` and an unset timestamp as the
// zero instant `0001-01-01T00:00:00Z`. Both mean "nothing" on this side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Unix seconds of `0001-01-01T00:00:00Z`.
const ZERO_INSTANT_SECS: i64 = -62_135_596_800;

/// A list that may arrive as `null`. Pair with `#[serde(default)]` so a
/// missing field decodes the same way.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// An optional timestamp where the zero instant (or anything before it)
/// means unset.
pub(crate) fn unset_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let time = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(time.filter(|t| t.timestamp() > ZERO_INSTANT_SECS))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Wire {
        #[serde(default, deserialize_with = "super::null_as_empty")]
        items: Vec<String>,
        #[serde(default, deserialize_with = "super::unset_time")]
        at: Option<chrono::DateTime<chrono::Utc>>,
    }

    fn decode(json: &str) -> Wire {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn null_and_missing_lists_are_empty() {
        assert!(decode(r#"{"items": null}"#).items.is_empty());
        assert!(decode("{}").items.is_empty());
        assert_eq!(decode(r#"{"items": ["*.tmp"]}"#).items, ["*.tmp"]);
    }

    #[test]
    fn zero_instant_is_unset() {
        assert!(decode(r#"{"at": "0001-01-01T00:00:00Z"}"#).at.is_none());
        assert!(decode(r#"{"at": null}"#).at.is_none());
        assert!(decode("{}").at.is_none());
        assert!(decode(r#"{"at": "2024-05-01T10:00:00Z"}"#).at.is_some());
    }
}
