use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocatorError {
    /// Located source text did not parse. `context` names the file, or holds
    /// the first characters of the text when there is no file.
    #[error("AST failed to parse in located source ({context}): {message}")]
    ParseToAstFailure { context: String, message: String },

    #[error("Source code string was empty")]
    EmptySourceCode,

    #[error("File \"{0}\" is not readable or does not exist")]
    InvalidFileLocation(String),

    #[error("\"{0}\" must be a directory, not a file or a missing path")]
    InvalidDirectory(String),

    /// `define()` call that does not declare a constant.
    #[error("Invalid constant node (first 50 characters: {0})")]
    InvalidConstantNode(String),

    #[error("Two closures start on line {line} of {context}")]
    TwoClosuresOnSameLine { context: String, line: usize },

    #[error(transparent)]
    Composer(#[from] ComposerError),

    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LocatorError {
    pub(crate) fn parse_failure(
        filename: Option<&str>,
        source: &[u8],
        message: String,
    ) -> Self {
        let context = match filename {
            Some(file) => format!("in {file}"),
            None => {
                let text = String::from_utf8_lossy(source);
                let snippet: String = text.chars().take(20).collect();
                format!("first 20 characters: {snippet}")
            }
        };
        LocatorError::ParseToAstFailure { context, message }
    }
}

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("Could not locate project directory \"{0}\"")]
    InvalidProjectDirectory(String),

    #[error("Could not locate a \"composer.json\" file in \"{0}\"")]
    MissingComposerJson(String),

    #[error("Could not parse JSON file \"{path}\": {message}")]
    FailedToParseJson { path: String, message: String },

    #[error("Invalid autoload mapping for \"{prefix}\" in \"{path}\"")]
    InvalidAutoloadMapping { prefix: String, path: String },
}
