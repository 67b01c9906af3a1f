use clinic_types::BranchError;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown branch {0:?}")]
    UnknownBranch(String),
    #[error("payment record not found or not updated")]
    PaymentNotFound,
    #[error("date arithmetic out of range: {0}")]
    DateOutOfRange(String),
    #[error(transparent)]
    Store(#[from] clinic_store::StoreError),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;

impl From<BranchError> for ClinicError {
    fn from(err: BranchError) -> Self {
        ClinicError::UnknownBranch(err.0)
    }
}
