use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The page has no channel metadata container at all.
    #[error("channel metadata missing from embedded data")]
    MetadataMissing,
}
