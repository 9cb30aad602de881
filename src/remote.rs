//! Remote data client.
//!
//! One async function per backend operation. Authenticated calls read the
//! bearer token from the session at call time and fail with
//! [`ClientError::Unauthenticated`] before touching the network when there
//! is none. No retries happen here.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use validator::Validate;

use crate::{
    config::Config,
    dto::{
        AuthResponse, CommentRequest, CreatePostRequest, FollowStatus, LikesResponse,
        LoginRequest, NotificationPage, PaginationParams, RegisterRequest, SearchResults,
        TrendingParams,
    },
    errors::{ClientError, ClientResult},
    models::{Comment, Post, UserProfile, UserRef},
    session::SessionHandle,
};

/// Backend operations the sync layer depends on.
#[async_trait]
pub trait FeedService: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse>;
    async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse>;
    async fn current_user(&self) -> ClientResult<UserProfile>;

    async fn user_profile(&self, user_id: &str) -> ClientResult<UserProfile>;
    async fn follow(&self, user_id: &str) -> ClientResult<()>;
    async fn unfollow(&self, user_id: &str) -> ClientResult<()>;
    async fn check_following(&self, user_id: &str) -> ClientResult<bool>;
    async fn search_users(&self, query: &str) -> ClientResult<Vec<UserRef>>;

    async fn list_posts(&self) -> ClientResult<Vec<Post>>;
    async fn user_posts(&self, user_id: &str) -> ClientResult<Vec<Post>>;
    async fn trending_posts(&self, params: &TrendingParams) -> ClientResult<Vec<Post>>;
    async fn get_post(&self, post_id: &str) -> ClientResult<Post>;
    async fn create_post(&self, request: &CreatePostRequest) -> ClientResult<Post>;
    async fn update_post(&self, post_id: &str, request: &CreatePostRequest) -> ClientResult<Post>;
    async fn delete_post(&self, post_id: &str) -> ClientResult<()>;
    async fn like_post(&self, post_id: &str) -> ClientResult<LikesResponse>;
    async fn search(&self, query: &str) -> ClientResult<SearchResults>;

    async fn list_comments(&self, post_id: &str) -> ClientResult<Vec<Comment>>;
    async fn add_comment(&self, post_id: &str, request: &CommentRequest) -> ClientResult<Comment>;
    async fn like_comment(&self, comment_id: &str) -> ClientResult<LikesResponse>;
    async fn delete_comment(&self, comment_id: &str) -> ClientResult<()>;

    async fn notifications(&self, page: PaginationParams) -> ClientResult<NotificationPage>;
    async fn mark_read(&self, notification_id: &str) -> ClientResult<()>;
    async fn mark_all_read(&self) -> ClientResult<()>;
}

/// HTTP implementation of [`FeedService`].
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

impl RemoteClient {
    pub fn new(config: &Config, session: SessionHandle) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            warn!("Failed to build HTTP client: {}", e);
            ClientError::NetworkUnavailable
        })?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    fn authed(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.session.token().ok_or(ClientError::Unauthenticated)?;
        Ok(self.public(method, path).bearer_auth(token))
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Vec<u8>> {
        let response = builder.send().await.map_err(|e| {
            warn!("Request failed before a response: {}", e);
            ClientError::from(e)
        })?;

        let status = response.status();
        let path = response.url().path().to_string();
        let body = response.bytes().await.map_err(ClientError::from)?;
        debug!("{} -> {}", path, status.as_u16());

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            let err = ClientError::from_response(status.as_u16(), &body);
            warn!("{} rejected with {}: {}", path, status.as_u16(), err);
            Err(err)
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let body = self.send(builder).await?;
        decode(&body)
    }

    async fn fetch_empty(&self, builder: RequestBuilder) -> ClientResult<()> {
        self.send(builder).await.map(|_| ())
    }
}

/// An empty body decodes like `null`, which suits `Option` and `Default`
/// shaped responses.
fn decode<T: DeserializeOwned>(body: &[u8]) -> ClientResult<T> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(ClientError::from)
}

fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[async_trait]
impl FeedService for RemoteClient {
    async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        request.validate()?;
        debug!("Attempting login for {}", request.email);
        let builder = self.public(Method::POST, "/auth/login").json(request);
        self.fetch(builder).await
    }

    async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse> {
        request.validate()?;
        debug!("Attempting registration for {}", request.username);
        let builder = self.public(Method::POST, "/auth/register").json(request);
        self.fetch(builder).await
    }

    async fn current_user(&self) -> ClientResult<UserProfile> {
        self.fetch(self.authed(Method::GET, "/auth/me")?).await
    }

    async fn user_profile(&self, user_id: &str) -> ClientResult<UserProfile> {
        let path = format!("/users/profile/{}", segment(user_id));
        self.fetch(self.authed(Method::GET, &path)?).await
    }

    async fn follow(&self, user_id: &str) -> ClientResult<()> {
        let path = format!("/users/follow/{}", segment(user_id));
        self.fetch_empty(self.authed(Method::POST, &path)?).await
    }

    async fn unfollow(&self, user_id: &str) -> ClientResult<()> {
        let path = format!("/users/unfollow/{}", segment(user_id));
        self.fetch_empty(self.authed(Method::POST, &path)?).await
    }

    async fn check_following(&self, user_id: &str) -> ClientResult<bool> {
        let path = format!("/auth/following/{}", segment(user_id));
        let status: FollowStatus = self.fetch(self.authed(Method::GET, &path)?).await?;
        Ok(status.is_following)
    }

    async fn search_users(&self, query: &str) -> ClientResult<Vec<UserRef>> {
        let path = format!("/users/search/{}", segment(query));
        self.fetch(self.authed(Method::GET, &path)?).await
    }

    async fn list_posts(&self) -> ClientResult<Vec<Post>> {
        self.fetch(self.authed(Method::GET, "/posts")?).await
    }

    async fn user_posts(&self, user_id: &str) -> ClientResult<Vec<Post>> {
        let path = format!("/posts/user/{}", segment(user_id));
        self.fetch(self.authed(Method::GET, &path)?).await
    }

    async fn trending_posts(&self, params: &TrendingParams) -> ClientResult<Vec<Post>> {
        let builder = self.authed(Method::GET, "/posts/trending")?.query(params);
        self.fetch(builder).await
    }

    async fn get_post(&self, post_id: &str) -> ClientResult<Post> {
        let path = format!("/posts/{}", segment(post_id));
        self.fetch(self.authed(Method::GET, &path)?).await
    }

    async fn create_post(&self, request: &CreatePostRequest) -> ClientResult<Post> {
        request.validate()?;
        let builder = self.authed(Method::POST, "/posts")?.json(request);
        self.fetch(builder).await
    }

    async fn update_post(&self, post_id: &str, request: &CreatePostRequest) -> ClientResult<Post> {
        request.validate()?;
        let path = format!("/posts/{}", segment(post_id));
        let builder = self.authed(Method::PUT, &path)?.json(request);
        self.fetch(builder).await
    }

    async fn delete_post(&self, post_id: &str) -> ClientResult<()> {
        let path = format!("/posts/{}", segment(post_id));
        self.fetch_empty(self.authed(Method::DELETE, &path)?).await
    }

    async fn like_post(&self, post_id: &str) -> ClientResult<LikesResponse> {
        let path = format!("/posts/like/{}", segment(post_id));
        let likes: Option<LikesResponse> = self.fetch(self.authed(Method::PUT, &path)?).await?;
        Ok(likes.unwrap_or_default())
    }

    async fn search(&self, query: &str) -> ClientResult<SearchResults> {
        let builder = self
            .authed(Method::GET, "/posts/search")?
            .query(&[("query", query)]);
        let results: Option<SearchResults> = self.fetch(builder).await?;
        Ok(results.unwrap_or_default())
    }

    async fn list_comments(&self, post_id: &str) -> ClientResult<Vec<Comment>> {
        let path = format!("/comments/post/{}", segment(post_id));
        let comments: Option<Vec<Comment>> = self.fetch(self.authed(Method::GET, &path)?).await?;
        Ok(comments.unwrap_or_default())
    }

    async fn add_comment(&self, post_id: &str, request: &CommentRequest) -> ClientResult<Comment> {
        request.validate()?;
        let path = format!("/comments/{}", segment(post_id));
        let builder = self.authed(Method::POST, &path)?.json(request);
        self.fetch(builder).await
    }

    async fn like_comment(&self, comment_id: &str) -> ClientResult<LikesResponse> {
        let path = format!("/comments/like/{}", segment(comment_id));
        let likes: Option<LikesResponse> = self.fetch(self.authed(Method::PUT, &path)?).await?;
        Ok(likes.unwrap_or_default())
    }

    async fn delete_comment(&self, comment_id: &str) -> ClientResult<()> {
        let path = format!("/comments/{}", segment(comment_id));
        self.fetch_empty(self.authed(Method::DELETE, &path)?).await
    }

    async fn notifications(&self, page: PaginationParams) -> ClientResult<NotificationPage> {
        let builder = self.authed(Method::GET, "/notifications")?.query(&page);
        self.fetch(builder).await
    }

    async fn mark_read(&self, notification_id: &str) -> ClientResult<()> {
        let path = format!("/notifications/{}/read", segment(notification_id));
        self.fetch_empty(self.authed(Method::PUT, &path)?).await
    }

    async fn mark_all_read(&self) -> ClientResult<()> {
        self.fetch_empty(self.authed(Method::PUT, "/notifications/read-all")?)
            .await
    }
}
