//! JSON export of method summaries
//!
//! ```json
//! {
//!   "method": "a.C.get(int)",
//!   "return_value": [{"from": "get", "nature": "←", "to": "ts[0:i]"}],
//!   "parameters": [[]],
//!   "modified": []
//! }
//! ```

use crate::features::linkage::domain::{Link, LinkNature, Links, MethodLinkedVariables};
use crate::shared::models::MethodRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub from: String,
    pub nature: String,
    pub to: String,
}

impl LinkRecord {
    pub fn from_link(link: &Link) -> Self {
        Self {
            from: link.from.to_string(),
            nature: link.nature.symbol().to_string(),
            to: link.to.to_string(),
        }
    }

    /// The nature, parsed back from its symbol
    pub fn nature(&self) -> Option<LinkNature> {
        LinkNature::from_symbol(&self.nature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Vec<LinkRecord>>,
    pub parameters: Vec<Vec<LinkRecord>>,
    #[serde(default)]
    pub modified: Vec<String>,
}

pub struct SummaryCodec;

impl SummaryCodec {
    pub fn encode(method: &MethodRef, summary: &MethodLinkedVariables) -> SummaryRecord {
        SummaryRecord {
            method: method.to_string(),
            return_value: summary.of_return().map(records),
            parameters: summary.of_parameters().iter().map(records).collect(),
            modified: summary.modified().iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn to_json(method: &MethodRef, summary: &MethodLinkedVariables) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self::encode(method, summary))
    }

    pub fn from_json(json: &str) -> serde_json::Result<SummaryRecord> {
        serde_json::from_str(json)
    }
}

fn records(links: &Links) -> Vec<LinkRecord> {
    links.iter().map(LinkRecord::from_link).collect()
}
