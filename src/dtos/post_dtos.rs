use serde::Deserialize;

/// Body of `POST /posts`. No field is validated for emptiness or length.
#[derive(Debug, Deserialize)]
pub struct CreatePostDTO {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// Raw pagination parameters of `GET /posts`, kept as strings so validation
/// can report the literal value a client sent.
#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
}
