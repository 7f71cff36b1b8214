mod loader;

pub use loader::{InputBundle, load_bundle, parse_bundle};
