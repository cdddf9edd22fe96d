pub mod ai;
pub mod creations;

pub use ai::{ApiResponse, ArticleRequest, BlogTitleRequest, ImageRequest};
pub use creations::CreationsResponse;
