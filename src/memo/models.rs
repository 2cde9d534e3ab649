//! Memo data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::core_types::{MemoId, UserId};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Memo row
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    #[sqlx(rename = "memo_id")]
    pub id: MemoId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    #[serde(rename = "createTime")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updateTime")]
    pub updated_at: DateTime<Utc>,
}

/// Create / update payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MemoRequest {
    #[validate(
        custom(function = "validate_title"),
        length(max = 200, message = "title must be at most 200 characters")
    )]
    #[schema(example = "Shopping list")]
    pub title: String,
    #[serde(default)]
    #[schema(example = "milk, eggs")]
    pub content: String,
}

/// Titles are stored trimmed, so whitespace alone counts as missing
fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("title is required")));
    }
    Ok(())
}

/// List query string
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MemoListQuery {
    /// Page number, starting at 1
    pub page: Option<i64>,
    /// Page size, 1-100
    pub limit: Option<i64>,
    /// Case-insensitive match on title or content
    pub keyword: Option<String>,
}

impl MemoListQuery {
    /// Resolve defaults and check ranges: (page, limit, keyword)
    pub fn resolve(&self) -> Result<(i64, i64, Option<String>), String> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 {
            return Err("page must be >= 1".to_string());
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {}", MAX_LIMIT));
        }
        let keyword = self
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        Ok((page, limit, keyword))
    }
}

/// Paged memo list
#[derive(Debug, Serialize, ToSchema)]
pub struct MemoPage {
    pub list: Vec<Memo>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Escape LIKE metacharacters and wrap in `%…%`
pub fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let q = MemoListQuery::default();
        assert_eq!(q.resolve().unwrap(), (1, 10, None));
    }

    #[test]
    fn test_query_ranges() {
        let bad_page = MemoListQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(bad_page.resolve().is_err());

        let bad_limit = MemoListQuery {
            limit: Some(101),
            ..Default::default()
        };
        assert!(bad_limit.resolve().is_err());
    }

    #[test]
    fn test_blank_keyword_ignored() {
        let q = MemoListQuery {
            keyword: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(q.resolve().unwrap().2, None);
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_memo_request_requires_title() {
        let req: MemoRequest = serde_json::from_str(r#"{"title":""}"#).unwrap();
        assert!(req.validate().is_err());
        let req: MemoRequest = serde_json::from_str(r#"{"title":"t"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.content, "");
    }

    #[test]
    fn test_memo_request_rejects_blank_title() {
        let req: MemoRequest = serde_json::from_str(r#"{"title":"   "}"#).unwrap();
        let errs = req.validate().unwrap_err();
        assert_eq!(
            crate::gateway::types::extract::validation_message(&errs),
            "title: title is required"
        );

        let long: MemoRequest =
            serde_json::from_str(&format!(r#"{{"title":"{}"}}"#, "t".repeat(201))).unwrap();
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_memo_serializes_times() {
        let now = Utc::now();
        let memo = Memo {
            id: 1,
            user_id: 2,
            title: "t".into(),
            content: "c".into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&memo).unwrap();
        assert_eq!(json["userId"], 2);
        assert!(json.get("createTime").is_some());
        assert!(json.get("updateTime").is_some());
    }
}
