use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("{0} table is empty")]
    EmptyTable(&'static str),
    #[error("duplicate name in table: {0}")]
    DuplicateName(String),
    #[error("unknown tier: {0}")]
    UnknownTier(String),
    #[error("unknown rank: {0}")]
    UnknownRank(String),
    #[error("no star modifier with count {0}")]
    UnknownStars(u8),
    /// Stars requested on a tier that cannot carry them.
    #[error("{tier} cannot carry {stars} stars")]
    InvalidStars { tier: String, stars: u8 },
    #[error("failed to parse tables: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
