use thiserror::Error;

/// Failure of a single asset load.
///
/// Cloneable so one result can be handed to every waiter of a shared load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError
{
        /// Non-success HTTP status.
        #[error("request for {url} failed with status {status}")]
        Http
        {
                url: String,
                status: u16,
        },

        #[error("failed to read {url}: {message}")]
        Io
        {
                url: String,
                message: String,
        },

        #[error("failed to decode {url}: {message}")]
        Decode
        {
                url: String,
                message: String,
        },

        /// The producer went away before resolving, e.g. a dropped task.
        #[error("load of {url} was dropped before completing")]
        Cancelled
        {
                url: String,
        },

        #[error("media element failed: {message}")]
        Media
        {
                message: String,
        },
}

impl LoadError
{
        pub fn decode(
                url: &str,
                error: impl std::fmt::Display,
        ) -> Self
        {
                Self::Decode {
                        url: url.to_string(),
                        message: error.to_string(),
                }
        }

        pub fn io(
                url: &str,
                error: impl std::fmt::Display,
        ) -> Self
        {
                Self::Io {
                        url: url.to_string(),
                        message: error.to_string(),
                }
        }
}
