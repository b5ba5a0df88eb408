pub mod cancel;
pub mod format;
pub mod jobs;
pub mod source;
pub mod status;
