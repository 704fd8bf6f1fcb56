//! Bindings for the feed contracts and the limits they impose on inputs.

use alloy::sol;
use alloy_primitives::{Address, address};

/// Net messaging contract. Deployed at the same address on every supported
/// chain.
pub const NET_ADDRESS: Address = address!("0x00000000B24D62781dB359b07880a105cD0b64e6");

/// Longest feed name the registry accepts.
pub const MAX_FEED_NAME_LEN: usize = 64;
/// Longest post text, title and body included.
pub const MAX_MESSAGE_LEN: usize = 4000;

sol! {
    #[derive(Debug)]
    interface INet {
        function sendMessage(string text, string topic, bytes data) external;
    }

    #[derive(Debug)]
    interface IFeedRegistry {
        struct RegisteredFeed {
            string feedName;
            string description;
            address registrant;
            uint64 registeredAt;
        }

        function registerFeed(string feedName, string description) external;
        function isFeedRegistered(string feedName) external view returns (bool);
        function getRegisteredFeeds(uint256 offset, uint256 limit)
            external
            view
            returns (RegisteredFeed[] memory);
    }
}

pub fn validate_feed_name(name: &str) -> Result<(), FeedInputError> {
    if name.is_empty() {
        return Err(FeedInputError::EmptyFeedName);
    }
    let len = name.chars().count();
    if len > MAX_FEED_NAME_LEN {
        return Err(FeedInputError::FeedNameTooLong { len });
    }
    Ok(())
}

/// Builds the post text. With a body, `title` becomes the first line and the
/// body follows after a blank line.
pub fn compose_post(title: &str, body: Option<&str>) -> Result<String, FeedInputError> {
    if title.is_empty() {
        return Err(FeedInputError::EmptyMessage);
    }
    let text = match body {
        Some(body) => format!("{title}\n\n{body}"),
        None => title.to_owned(),
    };
    let len = text.chars().count();
    if len > MAX_MESSAGE_LEN {
        return Err(FeedInputError::MessageTooLong { len });
    }
    Ok(text)
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FeedInputError {
    #[error("feed name cannot be empty")]
    EmptyFeedName,
    #[error("feed name cannot exceed {max} characters (got {len})", max = MAX_FEED_NAME_LEN)]
    FeedNameTooLong { len: usize },
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error(
        "message too long ({len} chars); maximum is {max} characters",
        max = MAX_MESSAGE_LEN
    )]
    MessageTooLong { len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("" => Err(FeedInputError::EmptyFeedName); "empty")]
    #[test_case("general" => Ok(()); "plain")]
    #[test_case(&"a".repeat(MAX_FEED_NAME_LEN) => Ok(()); "at limit")]
    #[test_case(&"a".repeat(MAX_FEED_NAME_LEN + 1) => Err(FeedInputError::FeedNameTooLong { len: 65 }); "over limit")]
    #[test_case(&"ü".repeat(MAX_FEED_NAME_LEN) => Ok(()); "counts chars not bytes")]
    fn feed_name_bounds(name: &str) -> Result<(), FeedInputError> {
        validate_feed_name(name)
    }

    #[test]
    fn post_with_body_joins_with_blank_line() {
        assert_eq!(compose_post("gm", Some("long form")).unwrap(), "gm\n\nlong form");
        assert_eq!(compose_post("gm", None).unwrap(), "gm");
    }

    #[test]
    fn post_length_counts_title_and_body() {
        let title = "t".repeat(MAX_MESSAGE_LEN - 2);
        assert!(compose_post(&title, None).is_ok());
        assert_eq!(
            compose_post(&title, Some("b")),
            Err(FeedInputError::MessageTooLong {
                len: MAX_MESSAGE_LEN + 1
            })
        );
    }

    #[test]
    fn empty_title_is_rejected_even_with_body() {
        assert_eq!(compose_post("", Some("body")), Err(FeedInputError::EmptyMessage));
    }
}
