mod metadata;
mod metadata_error;
mod project;
mod test;
mod tools;
mod wave;
pub use metadata::Metadata;
pub use metadata_error::MetadataError;
pub use project::Project;
pub use test::Test;
pub use tools::Tools;
pub use wave::Wave;
