mod client;
pub mod multipart;
mod request;
pub mod response;

pub use client::ApiClient;
pub use multipart::{MultipartBody, MultipartPart, PartValue};
pub use request::{ApiRequest, DecodeMode, RequestBody};
pub use response::decode_response;
