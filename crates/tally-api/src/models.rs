// Wire types for the aggregate endpoint.
//
// The backend is a Spring Data `Page`. Newer serializers nest the
// pagination metadata under `page`; older ones flatten it next to
// `content`. Both shapes deserialize into `AggregatePage`.

use serde::{Deserialize, Serialize};

/// One aggregated row. Dimension fields the request did not group by are
/// omitted (or `null`) on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecordDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub hours: f64,
}

/// Pagination metadata as sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_elements: u64,
    pub total_pages: usize,
    pub number: usize,
    pub size: usize,
}

/// A decoded page of aggregated records.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatePage {
    pub content: Vec<AggregatedRecordDto>,
    pub page: PageMeta,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPage {
    Nested {
        content: Vec<AggregatedRecordDto>,
        page: PageMeta,
    },
    Flat {
        content: Vec<AggregatedRecordDto>,
        #[serde(flatten)]
        page: PageMeta,
    },
}

impl<'de> Deserialize<'de> for AggregatePage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawPage::deserialize(deserializer)? {
            RawPage::Nested { content, page } | RawPage::Flat { content, page } => {
                Self { content, page }
            }
        })
    }
}

/// Error body shapes: `{"error":{"message":"…"}}` or `{"message":"…"}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<NestedError>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NestedError {
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    /// Nested message first, then the top-level one.
    pub(crate) fn into_message(self) -> Option<String> {
        self.error
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty())
            .or(self.message.filter(|m| !m.is_empty()))
    }
}
