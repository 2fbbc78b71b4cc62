pub mod rank;
pub mod upload;

pub use rank::{RankQuery, RankResponse, ScoreRequest};
pub use upload::{UploadJobRequest, UploadResumeRequest};
