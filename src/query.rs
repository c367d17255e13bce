//! Post listing parameters: raw query string -> typed params -> store filter.

use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::User;
use crate::error::ApiError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 9;
pub const MAX_LIMIT: u32 = 100;

/// Query parameters for GET /api/posts, exactly as they arrive.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub q: Option<String>,
    pub category_name: Option<String>,
    pub author_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorScope {
    /// The caller's own posts.
    Me,
    Id(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Validated listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostListParams {
    pub text: Option<String>,
    pub category_name: Option<String>,
    pub author: Option<AuthorScope>,
    pub pagination: Pagination,
}

impl PostListParams {
    pub fn parse(raw: ListPostsQuery) -> Result<Self, ApiError> {
        let author = match non_blank(raw.author_id) {
            None => None,
            Some(id) if id == "me" => Some(AuthorScope::Me),
            Some(id) => Some(AuthorScope::Id(
                Uuid::parse_str(&id)
                    .map_err(|_| ApiError::Validation("Invalid authorId".to_string()))?,
            )),
        };

        let page = parse_positive(raw.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(raw.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        Ok(Self {
            text: non_blank(raw.q),
            category_name: non_blank(raw.category_name),
            author,
            pagination: Pagination { page, limit },
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

/// Store-agnostic predicate over posts. Every populated field narrows the
/// result (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub published_only: bool,
    /// Case-insensitive substring of title, excerpt or content.
    pub text: Option<String>,
    pub author: Option<Uuid>,
    /// Case-insensitive exact match on the post slug.
    pub slug: Option<String>,
}

pub fn build_post_filter(params: &PostListParams, caller: Option<&User>) -> PostFilter {
    let caller_id = caller.map(|u| u.id);

    // `me` without a resolvable caller drops the author clause.
    let author = match params.author {
        Some(AuthorScope::Me) => caller_id,
        Some(AuthorScope::Id(id)) => Some(id),
        None => None,
    };

    let owner_view = author.is_some() && author == caller_id;

    PostFilter {
        published_only: !owner_view,
        text: params.text.clone(),
        author,
        slug: params.category_name.clone(),
    }
}
