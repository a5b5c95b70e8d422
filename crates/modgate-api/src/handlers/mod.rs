pub mod executions;
pub mod presigned_upload;
