pub mod auth;
pub mod domain;
pub mod error;
pub mod ports;
pub mod report;
pub mod session;
pub mod statement;
pub mod summary;
pub mod upload;

#[cfg(test)]
mod test_support;

pub use auth::Authenticator;
pub use domain::{
    Identity, MessageId, PublicIdentity, SessionRecord, SessionToken, Summary, SummaryWindow,
    TransactionRecord, UploadReceipt,
};
pub use error::{CoreError, CoreResult};
pub use ports::{
    BlobStore, Clock, CredentialStore, DeliveryChannel, PasswordHasher, PortError, PortResult,
    SystemClock, TokenStore, TransactionSink, TransactionSource,
};
pub use report::ReportDispatcher;
pub use session::SessionPolicy;
pub use summary::SummaryEngine;
pub use upload::UploadService;
