pub mod fetch_cache;
pub mod playlist_loader;
pub mod progress;
