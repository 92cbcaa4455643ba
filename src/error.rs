#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the collector crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Fetch failures ([`Error::RequestBuild`], [`Error::Transport`],
//! [`Error::HttpStatus`] and, under a strict decode policy,
//! [`Error::Decode`]) abort the repository walk that produced them. None of
//! them is retried.

use std::path::{Path, PathBuf};

/// Unified error type returned by the configuration loader, the collection
/// engine and the CLI.
///
/// Variants never embed access tokens. URLs carried by fetch errors are the
/// request URLs, which do not contain credentials.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading configuration files.
    #[error("failed to read configuration from {path:?}: {source}")]
    Io {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// The configured log file could not be opened for appending.
    #[error("failed to open log file {path:?}: {source}")]
    LogFile {
        /// Location of the log file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when the configuration violates invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// The request could not be constructed, e.g. the URL is malformed.
    #[error("failed to build request: {message}")]
    RequestBuild {
        /// Human readable message describing the construction failure.
        message: String
    },
    /// Network level failure while talking to the hosting API.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Request URL.
        url:     String,
        /// Human readable message reported by the transport.
        message: String
    },
    /// The hosting API answered with a non-success status code.
    #[error("request to {url} returned status {status}")]
    HttpStatus {
        /// Request URL.
        url:    String,
        /// HTTP status code of the response.
        status: u16
    },
    /// A response body could not be decoded.
    #[error("failed to decode response body: {source}")]
    Decode {
        /// Underlying JSON decoding error.
        source: serde_json::Error
    },
    /// Wraps serialization errors when writing repository reports.
    #[error("failed to serialize report: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Wraps I/O errors on the report output or the trigger input.
    #[error("failed to access standard streams: {source}")]
    Stream {
        /// Underlying I/O error.
        source: std::io::Error
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a request construction error.
    pub fn request_build<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::RequestBuild {
            message: message.into()
        }
    }

    /// Constructs a transport error for the given request URL.
    ///
    /// # Parameters
    ///
    /// * `url` - URL of the request that failed.
    /// * `message` - Description reported by the transport layer.
    pub fn transport<U, M>(url: U, message: M) -> Self
    where
        U: Into<String>,
        M: Into<String>
    {
        Self::Transport {
            url:     url.into(),
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Decode {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the configuration file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}
