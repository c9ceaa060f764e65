pub mod error;
pub mod fetch;
pub mod temp;
pub mod transform;

pub use error::{MediaError, Result, TransformError};
pub use fetch::{FileFetcher, HttpFetcher};
pub use temp::{TempFileHandle, TempFileStore};
pub use transform::{ReferencePaths, ScriptTransformer, TransformRequest, Transformer};
