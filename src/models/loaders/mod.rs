pub mod url_loader;

pub use url_loader::{load_urls, parse_urls};
