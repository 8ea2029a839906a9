//! BookStudio Library
//!
//! The stateful half of the studio: the persisted library of books, the
//! editor session over one of them, and the generation steps that fill
//! that book in through a `GenerationProvider`.

pub mod error;
pub mod pipeline;
pub mod session;
pub mod storage;
pub mod store;
pub mod studio;

pub use error::{StorageError, StorageResult};
pub use pipeline::{ChapterRun, StepOutcome};
pub use session::{EditorSession, StepId, StepStatus};
pub use storage::{BlobStorage, FileBlobStorage, MemoryBlobStorage};
pub use store::{LibraryStore, LoadStatus, CORRUPT_LIBRARY_KEY, LIBRARY_KEY};
pub use studio::{ExportFile, Notice, Studio};
