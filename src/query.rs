//! Turns a form snapshot into the query sent to the calculation backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::config::{Abundance, SessionConfig};
use crate::error::QueryError;
use crate::format::js_number_string;

/// Fixed rest times in hours; the final one comes from the form.
pub const REST_PREFIX: [&str; 4] = ["0", "1", "24", "360"];

/// Form field moved into the last rest slot.
pub const TIME_OFF_FIELD: &str = "time_off";

const DERIVED_FIELDS: [&str; 4] = ["calculate", "decay", "abundance", "rest"];

/// Field name to value, as entered in the sample form.
pub type FormSnapshot = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Calculation {
    Activation,
    Scattering,
}

impl Calculation {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "activation" => Some(Calculation::Activation),
            "scattering" => Some(Calculation::Scattering),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Calculation::Activation => "activation",
            Calculation::Scattering => "scattering",
        }
    }
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub calculate: Calculation,
    pub decay: f64,
    pub abundance: Abundance,
    pub rest: [String; 5],
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

pub fn build_query(
    form: &FormSnapshot,
    session: &SessionConfig,
    target: Calculation,
) -> Result<Query, QueryError> {
    let time_off = form
        .get(TIME_OFF_FIELD)
        .cloned()
        .ok_or(QueryError::MissingTimeOff)?;

    let mut fields = form.clone();
    fields.remove(TIME_OFF_FIELD);
    for name in DERIVED_FIELDS {
        if fields.remove(name).is_some() {
            debug!(field = name, "dropping form field shadowed by query");
        }
    }

    let rest = [
        REST_PREFIX[0].to_string(),
        REST_PREFIX[1].to_string(),
        REST_PREFIX[2].to_string(),
        REST_PREFIX[3].to_string(),
        time_off,
    ];

    Ok(Query {
        calculate: target,
        decay: session.decay_level,
        abundance: session.abundance,
        rest,
        fields,
    })
}

impl Query {
    /// Pairs for an `application/x-www-form-urlencoded` body. The rest
    /// times go out as repeated `rest[]` entries.
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("calculate".to_string(), self.calculate.to_string()),
            ("decay".to_string(), js_number_string(self.decay)),
            ("abundance".to_string(), self.abundance.to_string()),
        ];
        pairs.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs.extend(self.rest.iter().map(|t| ("rest[]".to_string(), t.clone())));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(entries: &[(&str, &str)]) -> FormSnapshot {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn time_off_becomes_last_rest_time() {
        let form = form(&[("sample", "Co"), ("mass", "1"), ("time_off", "720")]);
        let query = build_query(&form, &SessionConfig::default(), Calculation::Activation).unwrap();
        assert_eq!(query.rest, ["0", "1", "24", "360", "720"]);
        assert!(!query.fields.contains_key("time_off"));
        assert_eq!(query.fields.get("sample").map(String::as_str), Some("Co"));
        assert_eq!(query.calculate, Calculation::Activation);
    }

    #[test]
    fn missing_time_off_is_an_error() {
        let form = form(&[("sample", "Co")]);
        assert_eq!(
            build_query(&form, &SessionConfig::default(), Calculation::Scattering),
            Err(QueryError::MissingTimeOff)
        );
    }

    #[test]
    fn session_values_override_form_fields() {
        let form = form(&[("time_off", "1"), ("decay", "9"), ("calculate", "all")]);
        let session = SessionConfig {
            decay_level: 0.002,
            abundance: Abundance::Iupac,
            ..SessionConfig::default()
        };
        let query = build_query(&form, &session, Calculation::Scattering).unwrap();
        assert!(query.fields.is_empty());

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["calculate"], "scattering");
        assert_eq!(json["decay"], 0.002);
        assert_eq!(json["abundance"], "IUPAC");
        assert_eq!(json["rest"][4], "1");
    }

    #[test]
    fn form_pairs_repeat_rest() {
        let form = form(&[("sample", "H2O"), ("time_off", "10d")]);
        let query = build_query(&form, &SessionConfig::default(), Calculation::Activation).unwrap();
        let pairs = query.to_form_pairs();
        let rest: Vec<&str> = pairs
            .iter()
            .filter(|(k, _)| k == "rest[]")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(rest, ["0", "1", "24", "360", "10d"]);
        assert!(pairs.contains(&("decay".to_string(), "0.0005".to_string())));
        assert!(pairs.iter().all(|(k, _)| k != "rest" && k != "time_off"));
    }
}
