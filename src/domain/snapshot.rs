//! Plain nested snapshots used to build trees and to report their state.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{ChildType, GrandChildType};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::number::{lossless, lossless_option};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentSnapshot {
    pub first: String,
    pub last: String,
    #[serde(with = "lossless")]
    pub num1: f64,
    #[serde(with = "lossless")]
    pub num2: f64,
    pub children: Vec<ChildSnapshot>,
}

/// Child description. `type` and `num` are drawn at build time when absent;
/// `children` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSnapshot {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChildType>,
    #[serde(default, with = "lossless_option", skip_serializing_if = "Option::is_none")]
    pub num: Option<f64>,
    pub children: Vec<GrandChildSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrandChildSnapshot {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<GrandChildType>,
    #[serde(default, with = "lossless_option", skip_serializing_if = "Option::is_none")]
    pub num: Option<f64>,
}

impl ParentSnapshot {
    /// `children` x `grandchildren` shape with every random field left open.
    pub fn uniform(
        first: impl Into<String>,
        last: impl Into<String>,
        num1: f64,
        num2: f64,
        children: usize,
        grandchildren: usize,
    ) -> Self {
        let child = ChildSnapshot {
            kind: None,
            num: None,
            children: vec![GrandChildSnapshot::default(); grandchildren],
        };
        Self {
            first: first.into(),
            last: last.into(),
            num1,
            num2,
            children: vec![child; children],
        }
    }

    /// The benchmark snapshot: Foo Bar, 1 + 2, 100 children of 10 grandchildren.
    pub fn standard() -> Self {
        Self::uniform("Foo", "Bar", 1.0, 2.0, 100, 10)
    }

    pub fn from_json(json: &str) -> DomainResult<Self> {
        serde_json::from_str(json).map_err(|e| DomainError::MalformedSnapshot {
            message: e.to_string(),
        })
    }

    /// Non-finite numbers are written as `"NaN"`, `"inf"` or `"-inf"`.
    pub fn to_json(&self) -> DomainResult<String> {
        serde_json::to_string(self).map_err(serialize_err)
    }

    pub fn to_json_pretty(&self) -> DomainResult<String> {
        serde_json::to_string_pretty(self).map_err(serialize_err)
    }

    pub fn grandchild_count(&self) -> usize {
        self.children.iter().map(|c| c.children.len()).sum()
    }
}

fn serialize_err(e: serde_json::Error) -> DomainError {
    DomainError::Serialize {
        message: e.to_string(),
    }
}
