pub mod comments;
pub mod episode_likes;
pub mod episodes;
pub mod notifications;
pub mod reports;
pub mod series;
pub mod series_comments;
pub mod series_likes;
pub mod sessions;
pub mod users;
