//! Serde model of the Zimbra filter records.
//!
//! A category holds either one object or a list of objects, and scalar
//! fields are strings (`"index": "4"`, `"negative": "1"`). The JSON SOAP
//! interface also sends real numbers and booleans, so both are accepted on
//! input; output always uses strings.
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One object or a list of objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }

    /// `None` for no items, a bare object for one, a list otherwise.
    pub fn from_vec(mut items: Vec<T>) -> Option<Self> {
        match items.len() {
            0 => None,
            1 => items.pop().map(Self::One),
            _ => Some(Self::Many(items)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Str(s) => s,
            Self::Int(i) => i.to_string(),
            Self::Bool(b) => if b { "1" } else { "0" }.to_string(),
        }
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

pub(crate) fn opt_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

/// The SOAP interface wraps `filterTests` and `filterActions` in a list of
/// one; saved records use the bare object.
fn single<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let mut items = OneOrMany::<T>::deserialize(deserializer)?.into_vec();
    match items.len() {
        1 => Ok(items.remove(0)),
        n => Err(serde::de::Error::custom(format!("expected one object, found {n}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    pub name: String,
    #[serde(deserialize_with = "scalar")]
    pub active: String,
    #[serde(deserialize_with = "single")]
    pub filter_tests: FilterTests,
    #[serde(default, deserialize_with = "single")]
    pub filter_actions: FilterActions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterTests {
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_test: Option<OneOrMany<HeaderTest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_test: Option<OneOrMany<AddressTest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_test: Option<OneOrMany<SizeTest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_test: Option<OneOrMany<DateTest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_test: Option<OneOrMany<BodyTest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_exists_test: Option<OneOrMany<HeaderExistsTest>>,
    /// Categories without a typed counterpart.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterActions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_keep: Option<OneOrMany<IndexOnly>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_discard: Option<OneOrMany<IndexOnly>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_stop: Option<OneOrMany<IndexOnly>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_file_into: Option<OneOrMany<FileIntoAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_redirect: Option<OneOrMany<RedirectAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_flag: Option<OneOrMany<FlagAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_tag: Option<OneOrMany<TagAction>>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderTest {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub negative: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<String>,
    pub string_comparison: String,
    pub header: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressTest {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub negative: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<String>,
    pub string_comparison: String,
    #[serde(default = "default_part")]
    pub part: String,
    pub header: String,
    pub value: String,
}

fn default_part() -> String {
    "all".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeTest {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub negative: Option<String>,
    pub number_comparison: String,
    #[serde(deserialize_with = "scalar")]
    pub s: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTest {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub negative: Option<String>,
    pub date_comparison: String,
    #[serde(deserialize_with = "scalar")]
    pub d: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyTest {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub negative: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderExistsTest {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    #[serde(default, deserialize_with = "opt_scalar", skip_serializing_if = "Option::is_none")]
    pub negative: Option<String>,
    pub header: String,
}

/// `actionKeep`, `actionDiscard` and `actionStop` carry only their index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexOnly {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIntoAction {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    pub folder_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedirectAction {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    pub a: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagAction {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    pub flag_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAction {
    #[serde(deserialize_with = "scalar")]
    pub index: String,
    pub tag_name: String,
}

/// `<filterRules>` wrapper used by the get/modify requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_rule: Option<OneOrMany<FilterRule>>,
}
