use nf_client::ClientError;
use thiserror::Error;

/// Local input checks that run before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Post cannot be empty")]
    EmptyPost,
    #[error("Post is {len} characters, the limit is {max}")]
    PostTooLong { len: usize, max: usize },
    #[error("Please enter a valid User ID")]
    InvalidUserId,
    #[error("Username must be at least 3 characters")]
    UsernameTooShort,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FollowError {
    #[error("Please enter a User ID")]
    EmptyInput,
    #[error("You cannot follow yourself")]
    OwnAccount,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ClientError),
}
