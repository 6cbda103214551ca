//! REST resources served by the registration backend.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;

pub fn departments_route() -> &'static str {
    "/departments"
}

pub fn locations_route() -> &'static str {
    "/locations"
}

pub fn basic_info_route() -> &'static str {
    "/basicInfo"
}

pub fn details_route() -> &'static str {
    "/details"
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameLikeQuery {
    pub name_like: String,
}

/// `_page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(rename = "_page")]
    pub page: u32,
    #[serde(rename = "_limit")]
    pub limit: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_uses_underscored_wire_names() {
        let encoded = serde_json::to_value(PageQuery { page: 2, limit: 5 }).expect("encode");
        assert_eq!(encoded, serde_json::json!({ "_page": 2, "_limit": 5 }));
    }
}
