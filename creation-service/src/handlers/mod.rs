pub mod ai;
pub mod creations;
pub mod health;

pub use ai::{
    generate_article, generate_blog_title, generate_image, remove_image_background,
    remove_image_object, resume_review,
};
pub use creations::{list_published_creations, list_user_creations};
pub use health::{health_check, metrics_endpoint, readiness_check};
