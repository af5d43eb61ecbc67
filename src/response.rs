//! Responses from the calculation backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Detail key used for every failure synthesized by a transport.
pub const TRANSPORT_ERROR_KEY: &str = "fetch error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    Map(BTreeMap<String, Value>),
    Text(String),
}

impl Detail {
    /// Category and message pairs in display order (descending key).
    pub fn entries(&self) -> Vec<(String, String)> {
        match self {
            Detail::Map(map) => map
                .iter()
                .rev()
                .map(|(key, value)| (key.clone(), value_text(value)))
                .collect(),
            Detail::Text(text) => vec![("error".to_string(), text.clone())],
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Detail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<Sample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<Section<Activation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scattering: Option<Section<NeutronScattering>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xray_scattering: Option<Section<XrayScattering>>,
}

impl Response {
    pub fn failure(category: &str, message: impl Into<String>) -> Self {
        let mut detail = BTreeMap::new();
        detail.insert(category.to_string(), Value::String(message.into()));
        Self {
            success: false,
            detail: Some(Detail::Map(detail)),
            error: None,
            version: None,
            sample: None,
            activation: None,
            scattering: None,
            xray_scattering: None,
        }
    }

    /// The shape every transport reports its own failures in.
    pub fn transport_failure(cause: impl std::fmt::Display) -> Self {
        Self::failure(TRANSPORT_ERROR_KEY, cause.to_string())
    }

    /// Detail entries for display. A failure without detail falls back to
    /// the top-level error text.
    pub fn failure_entries(&self) -> Vec<(String, String)> {
        match (&self.detail, &self.error) {
            (Some(detail), _) => detail.entries(),
            (None, Some(error)) => vec![("error".to_string(), error.clone())],
            (None, None) => vec![("response".to_string(), "calculation failed".to_string())],
        }
    }
}

/// A calculation result, or the error that calculation raised while the
/// others may still have succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Section<T> {
    Failed { error: String },
    Done(T),
}

impl<T> Section<T> {
    pub fn done(&self) -> Option<&T> {
        match self {
            Section::Done(value) => Some(value),
            Section::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    #[serde(default)]
    pub formula: String,
    pub formula_latex: String,
    pub mass: f64,
    pub density: f64,
    pub thickness: f64,
    #[serde(default)]
    pub natural_density: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    pub flux: f64,
    #[serde(default)]
    pub fast: f64,
    #[serde(rename = "Cd", default)]
    pub cd: f64,
    pub exposure: f64,
    pub rest: Vec<f64>,
    pub activity: Vec<ActivityRow>,
    pub total: Vec<f64>,
    pub decay_level: f64,
    pub decay_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub isotope: String,
    pub reaction: String,
    pub product: String,
    pub halflife: String,
    #[serde(default)]
    pub comments: Option<String>,
    pub levels: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutronScattering {
    pub neutron: NeutronSource,
    pub xs: CrossSections,
    pub sld: NeutronSld,
    pub penetration: f64,
    #[serde(default)]
    pub transmission: Option<f64>,
    pub contrast_match: ContrastMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutronSource {
    pub wavelength: f64,
    pub energy: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSections {
    pub coh: f64,
    pub abs: f64,
    pub incoh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutronSld {
    pub real: f64,
    pub imag: f64,
    pub incoh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastMatch {
    #[serde(rename = "D2O_fraction")]
    pub d2o_fraction: Option<f64>,
    pub sld: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XrayScattering {
    pub xray: XraySource,
    pub sld: XraySld,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XraySource {
    pub wavelength: f64,
    pub energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XraySld {
    pub real: f64,
    pub imag: f64,
}
