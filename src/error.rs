use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid offset expression `{input}` at byte {at}")]
    InvalidOffset { input: String, at: usize },

    #[error(
        "template mismatch for `{property}`: start value has {start} numbers, end value has {end}"
    )]
    TemplateMismatch {
        property: String,
        start: usize,
        end: usize,
    },

    #[error("unknown easing: {0}")]
    UnknownEasing(String),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("option `{name}` expects {expected}")]
    InvalidOptionValue {
        name: String,
        expected: &'static str,
    },

    #[error("no component registered as `{0}`")]
    UnknownComponent(String),
}

pub type Result<T> = std::result::Result<T, Error>;
