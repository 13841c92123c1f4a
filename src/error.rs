use log::{error, warn};
use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder, Request};
use thiserror::Error;

use crate::logging::RequestId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Election closed")]
    ElectionClosed,
    #[error("Unregistered voter")]
    UnregisteredVoter,
    #[error("Already voted!")]
    AlreadyVoted,
    #[error("Either put user or both id number and full name")]
    MissingIdentityInfo,
    #[error("Id number '{0}' is already registered in this election")]
    DuplicateVoterOrCandidate(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) => Status::InternalServerError,
            Self::ElectionClosed | Self::UnregisteredVoter => Status::Forbidden,
            Self::AlreadyVoted | Self::DuplicateVoterOrCandidate(_) => Status::Conflict,
            Self::MissingIdentityInfo | Self::BadRequest(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let id = RequestId::of(req);
        if status == Status::InternalServerError {
            error!("req{id} failed: {self}");
        } else {
            warn!("req{id} rejected: {self}");
        }
        (status, self.to_string()).respond_to(req)
    }
}
