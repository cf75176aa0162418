//! MQTT topic names and topic filters

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// AWS IoT Core limit on topic length, in bytes
pub const MAX_TOPIC_LENGTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicError {
    #[error("Topic must not be empty")]
    Empty,
    #[error("Topic is {0} bytes long, the limit is {MAX_TOPIC_LENGTH}")]
    TooLong(usize),
    #[error("Wildcards are not allowed in a publish topic: {0}")]
    WildcardInTopic(String),
    #[error("Invalid topic filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
}

/// Check that `topic` can be published to
pub fn validate_publish_topic(topic: &str) -> Result<(), TopicError> {
    check_length(topic)?;
    if topic.contains(['+', '#']) {
        return Err(TopicError::WildcardInTopic(topic.to_string()));
    }
    Ok(())
}

fn check_length(topic: &str) -> Result<(), TopicError> {
    if topic.is_empty() {
        return Err(TopicError::Empty);
    }
    if topic.len() > MAX_TOPIC_LENGTH {
        return Err(TopicError::TooLong(topic.len()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterLevel {
    Exact(String),
    /// `+`
    SingleLevel,
    /// `#`, only as the last level
    MultiLevel,
}

/// A parsed MQTT subscription filter such as `+/+/+/state` or `vehicles/#`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    raw: String,
    levels: Vec<FilterLevel>,
}

impl TopicFilter {
    pub fn parse(filter: &str) -> Result<Self, TopicError> {
        check_length(filter)?;

        let invalid = |reason: &str| TopicError::InvalidFilter {
            filter: filter.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = filter.split('/').collect();
        let mut levels = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let level = match *part {
                "+" => FilterLevel::SingleLevel,
                "#" if index + 1 == parts.len() => FilterLevel::MultiLevel,
                "#" => return Err(invalid("'#' is only allowed as the last level")),
                other if other.contains(['+', '#']) => {
                    return Err(invalid("wildcards must occupy a whole level"))
                }
                other => FilterLevel::Exact(other.to_string()),
            };
            levels.push(level);
        }

        Ok(Self {
            raw: filter.to_string(),
            levels,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether a message published on `topic` is delivered to this filter.
    ///
    /// Topics starting with `$` are reserved and never match a leading wildcard.
    pub fn matches(&self, topic: &str) -> bool {
        if topic.starts_with('$')
            && matches!(
                self.levels.first(),
                Some(FilterLevel::SingleLevel | FilterLevel::MultiLevel)
            )
        {
            return false;
        }

        let mut topic_levels = topic.split('/');
        for level in &self.levels {
            match level {
                FilterLevel::MultiLevel => return true,
                FilterLevel::SingleLevel => {
                    if topic_levels.next().is_none() {
                        return false;
                    }
                }
                FilterLevel::Exact(expected) => match topic_levels.next() {
                    Some(actual) if actual == expected => {}
                    _ => return false,
                },
            }
        }
        topic_levels.next().is_none()
    }
}

impl FromStr for TopicFilter {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("+/+/+/state", "fleet/truck/42/state", true)]
    #[case("+/+/+/state", "fleet/truck/state", false)]
    #[case("+/+/+/state", "fleet/truck/42/state/extra", false)]
    #[case("+/+/+/state", "fleet/truck/42/status", false)]
    #[case("vehicles/#", "vehicles", true)]
    #[case("vehicles/#", "vehicles/1/state", true)]
    #[case("vehicles/#", "trucks/1", false)]
    #[case("#", "anything/at/all", true)]
    #[case("a/b", "a/b", true)]
    #[case("a/b", "a/b/c", false)]
    #[case("a/+", "a/", true)]
    #[case("+/state", "$aws/state", false)]
    #[case("#", "$aws/things/x/shadow", false)]
    #[case("$aws/things/+/shadow/update", "$aws/things/x/shadow/update", true)]
    fn test_filter_matching(#[case] filter: &str, #[case] topic: &str, #[case] expected: bool) {
        let filter = TopicFilter::parse(filter).unwrap();
        assert_eq!(filter.matches(topic), expected, "{} vs {}", filter, topic);
    }

    #[rstest]
    #[case("")]
    #[case("a/#/b")]
    #[case("a/b+")]
    #[case("a#")]
    fn test_invalid_filters(#[case] filter: &str) {
        assert!(
            TopicFilter::parse(filter).is_err(),
            "{filter} should be rejected"
        );
    }

    #[test]
    fn test_filter_length_limit() {
        let long = "a".repeat(MAX_TOPIC_LENGTH + 1);
        assert_eq!(
            TopicFilter::parse(&long),
            Err(TopicError::TooLong(MAX_TOPIC_LENGTH + 1))
        );
    }

    #[rstest]
    #[case("fleet/truck/42/state", true)]
    #[case("fleet/+/42/state", false)]
    #[case("fleet/#", false)]
    #[case("", false)]
    fn test_publish_topic_validation(#[case] topic: &str, #[case] valid: bool) {
        assert_eq!(validate_publish_topic(topic).is_ok(), valid);
    }
}
