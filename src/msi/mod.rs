mod cache;
mod directory;
mod line;

pub use cache::Cache;
pub use directory::Directory;
pub use line::{Line, LineState};
