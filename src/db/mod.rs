//! Subject persistence.
//!
//! - [`SubjectStore`] - the storage seam used by the pipelines and handlers
//! - [`TursoClient`] - libsql implementation (in-memory, local file, or remote Turso)

pub mod traits;
pub mod turso;

pub use traits::{DatabaseProvider, SubjectStore};
pub use turso::TursoClient;

#[cfg(test)]
pub use traits::MockSubjectStore;
