use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;

use crate::AppState;
use crate::dtos::post_dtos::{CreatePostDTO, ListPostsParams};
use crate::errors::ApiError;
use crate::repositories::post_repository::PostRepository;

pub const MAX_POSTS_LIMIT: i64 = 1000;

/// Inserts a post entity (and its tags) into the db.
///
/// Query example:
/// [POST] host/posts
/// {
///     "title": "title",
///     "body": "body",
///     "tags": ["tag1", "tag2"]
/// }
#[post("/posts")]
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<CreatePostDTO>,
) -> Result<HttpResponse, ApiError> {
    PostRepository::add_post(&state.pg_pool, body.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Returns the list of posts with offset and limit bounds, newest first.
/// Offset and limit are optional URL parameters; defaults are 0 and
/// `MAX_POSTS_LIMIT`.
#[get("/posts")]
pub async fn list_posts(
    state: web::Data<AppState>,
    params: web::Query<ListPostsParams>,
) -> Result<HttpResponse, ApiError> {
    let (offset, limit) = validate_pagination(&params)?;
    let posts = PostRepository::list_posts(&state.pg_pool, offset, limit).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Resolves and validates the pagination parameters. Runs before any database
/// access, so a bad parameter never costs a pooled connection.
fn validate_pagination(params: &ListPostsParams) -> Result<(i64, i64), ApiError> {
    let offset = match params.offset.as_deref() {
        None | Some("") => 0,
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            ApiError::BadRequest(format!(
                "incorrect offset URL parameter, actual: {}, expected: positive integer",
                raw
            ))
        })?,
    };
    let limit = match params.limit.as_deref() {
        None | Some("") => MAX_POSTS_LIMIT,
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            ApiError::BadRequest(format!(
                "incorrect limit URL parameter, actual: {}, expected: positive integer",
                raw
            ))
        })?,
    };

    if offset < 0 {
        return Err(ApiError::BadRequest(
            "offset cannot be less than 0".to_string(),
        ));
    }
    if limit < 0 {
        return Err(ApiError::BadRequest(
            "limit cannot be less than 0".to_string(),
        ));
    }
    if limit > MAX_POSTS_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit cannot be greater than {}",
            MAX_POSTS_LIMIT
        )));
    }

    Ok((offset, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use deadpool_postgres::Runtime;
    use tokio_postgres::NoTls;

    use crate::errors::json_error_handler;

    // The pool connects lazily, so handlers that fail validation before any
    // database access can run against a pool that points nowhere.
    fn test_state() -> web::Data<AppState> {
        let mut cfg = deadpool_postgres::Config::new();
        cfg.host = Some("127.0.0.1".to_string());
        cfg.user = Some("postgres".to_string());
        cfg.dbname = Some("blog_test".to_string());
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .expect("failed to create test pool");
        web::Data::new(AppState { pg_pool: pool })
    }

    async fn get_posts(path: &str) -> (StatusCode, String) {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .service(list_posts),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[actix_web::test]
    async fn list_posts_rejects_incorrect_limit() {
        let (status, body) = get_posts("/posts?offset=0&limit=wrong_value").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            r#"{"error":"incorrect limit URL parameter, actual: wrong_value, expected: positive integer"}"#
        );
    }

    #[actix_web::test]
    async fn list_posts_rejects_negative_limit() {
        let (status, body) = get_posts("/posts?offset=0&limit=-20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"limit cannot be less than 0"}"#);
    }

    #[actix_web::test]
    async fn list_posts_rejects_out_of_bounds_limit() {
        let (status, body) = get_posts("/posts?offset=0&limit=2000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"limit cannot be greater than 1000"}"#);
    }

    #[actix_web::test]
    async fn list_posts_rejects_incorrect_offset() {
        let (status, body) = get_posts("/posts?offset=wrong_value&limit=10").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            r#"{"error":"incorrect offset URL parameter, actual: wrong_value, expected: positive integer"}"#
        );
    }

    #[actix_web::test]
    async fn list_posts_rejects_negative_offset() {
        let (status, body) = get_posts("/posts?offset=-1&limit=100").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"offset cannot be less than 0"}"#);
    }

    #[actix_web::test]
    async fn create_post_rejects_malformed_json() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .service(create_post),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/posts")
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"title": "title", "body":"#)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.starts_with(r#"{"error":"#), "body: {}", body);
    }

    // `use actix_web::test` shadows the built-in `#[test]` attribute in this
    // module, so the sync tests qualify it explicitly.
    #[core::prelude::v1::test]
    fn pagination_defaults_apply_to_missing_and_empty_params() {
        let params = ListPostsParams {
            offset: None,
            limit: Some(String::new()),
        };
        assert_eq!(validate_pagination(&params).unwrap(), (0, MAX_POSTS_LIMIT));
    }

    #[core::prelude::v1::test]
    fn pagination_accepts_explicit_bounds() {
        let params = ListPostsParams {
            offset: Some("10".to_string()),
            limit: Some("1000".to_string()),
        };
        assert_eq!(validate_pagination(&params).unwrap(), (10, 1000));
    }
}
