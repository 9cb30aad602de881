use serde::Serialize;
use validator::Validate;

#[derive(Debug, Validate, Serialize)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 100, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Validate, Serialize)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Validate, Serialize)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 280, message = "Posts must be 1-280 characters"))]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CreatePostRequest {
    pub fn new(content: &str, image: Option<String>) -> Self {
        Self {
            content: content.trim().to_string(),
            image: image.filter(|url| !url.trim().is_empty()),
        }
    }
}

#[derive(Debug, Validate, Serialize)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 500, message = "Comments must be 1-500 characters"))]
    pub content: String,
}

impl CommentRequest {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.trim().to_string(),
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationParams {
    pub page: usize,
    pub limit: usize,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingParams {
    pub time_frame: String,
    pub limit: usize,
}

impl Default for TrendingParams {
    fn default() -> Self {
        Self {
            time_frame: "24h".to_string(),
            limit: 10,
        }
    }
}
