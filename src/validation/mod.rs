//! Local input checks. Nothing here touches the network.

pub mod file;
pub mod prompt;
pub mod sniffer;
pub mod source;

pub use file::{
    FileValidator, encode_upload, encode_validated, read_validated, validate_base64_size,
};
pub use prompt::{MAX_PROMPT_CHARS, PromptValidator, clamp_prompt_input};
pub use sniffer::{ImageFormat, sniff};
pub use source::{LocalFileUpload, MemoryUpload, UploadSource};
