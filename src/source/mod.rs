mod discovery;
mod reader;
mod registry;

pub use discovery::{discover, SourceFile};
pub use reader::load_headlines;
pub use registry::SourceRegistry;
