use axum::extract::{Path, State};
use chrono::Utc;

use super::{ApiResult, Deleted, deleted, found, ok};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiQuery},
    models::{
        self, ApiResponse, Article, ArticleFilter, CreateArticleRequest, ErrorEnvelope,
        PageRequest, StatutArticle, UpdateArticleRequest,
    },
    repository::RepositoryState,
};

/// list_blog
///
/// [Public Route] Published articles, newest first.
#[utoipa::path(
    get,
    path = "/api/blog",
    params(ArticleFilter),
    responses(
        (status = 200, description = "Published articles", body = ApiResponse<Vec<Article>>),
        (status = 503, description = "Store unreachable", body = ErrorEnvelope)
    )
)]
pub async fn list_blog(
    State(repo): State<RepositoryState>,
    ApiQuery(mut filter): ApiQuery<ArticleFilter>,
) -> ApiResult<Vec<Article>> {
    filter.statut = Some(StatutArticle::Publie);
    let page = PageRequest::new(filter.page, filter.limit);
    let articles = repo.list_articles(&filter, page).await?;
    Ok(axum::Json(ApiResponse::paginated(articles, page)))
}

/// get_blog_article
///
/// [Public Route] A published article by slug. Drafts answer 404.
#[utoipa::path(
    get,
    path = "/api/blog/{slug}",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Found", body = ApiResponse<Article>),
        (status = 404, description = "Unknown or unpublished", body = ErrorEnvelope)
    )
)]
pub async fn get_blog_article(
    State(repo): State<RepositoryState>,
    Path(slug): Path<String>,
) -> ApiResult<Article> {
    let article = repo
        .find_article_by_slug(&slug)
        .await?
        .filter(Article::is_published);
    ok(found(article, "article")?)
}

#[utoipa::path(
    get,
    path = "/api/admin/articles",
    params(ArticleFilter),
    responses((status = 200, description = "All articles", body = ApiResponse<Vec<Article>>))
)]
pub async fn list_all_articles(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    ApiQuery(filter): ApiQuery<ArticleFilter>,
) -> ApiResult<Vec<Article>> {
    let page = PageRequest::new(filter.page, filter.limit);
    let articles = repo.list_articles(&filter, page).await?;
    Ok(axum::Json(ApiResponse::paginated(articles, page)))
}

/// create_article
///
/// [Authenticated Route] The caller becomes the author. Without an explicit
/// slug one is derived from the title; a taken slug answers 409.
#[utoipa::path(
    post,
    path = "/api/articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 200, description = "Created", body = ApiResponse<Article>),
        (status = 400, description = "Validation failed", body = ErrorEnvelope),
        (status = 409, description = "Slug already used", body = ErrorEnvelope)
    )
)]
pub async fn create_article(
    AuthUser { id: user_id, .. }: AuthUser,
    State(repo): State<RepositoryState>,
    ApiJson(payload): ApiJson<CreateArticleRequest>,
) -> ApiResult<Article> {
    let article = payload.into_article(models::new_id(), Some(user_id), Utc::now());
    article.validate()?;
    repo.insert_article(&article).await?;

    tracing::info!(article_id = %article.id, slug = %article.slug, "article created");
    ok(article)
}

/// update_article
///
/// [Authenticated Route] Publishing a draft stamps `date_publication` once;
/// later edits keep the original date.
#[utoipa::path(
    put,
    path = "/api/articles/{id}",
    params(("id" = String, Path, description = "Article id")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<Article>),
        (status = 404, description = "Not found", body = ErrorEnvelope),
        (status = 409, description = "Slug already used", body = ErrorEnvelope)
    )
)]
pub async fn update_article(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateArticleRequest>,
) -> ApiResult<Article> {
    let mut article = found(repo.get_article(&id).await?, "article")?;
    payload.apply(&mut article, Utc::now());
    article.validate()?;

    if !repo.replace_article(&article).await? {
        return Err(ApiError::not_found("article"));
    }
    ok(article)
}

#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    params(("id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn delete_article(
    _user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let removed = repo.delete_article(&id).await?;
    deleted(removed, id, "article")
}
