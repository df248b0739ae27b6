//! Query string and path segment decoding

use crate::error::ApiError;
use mathquest_core::TopicFilter;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Decode a percent-encoded component; `+` stands for a space
pub fn decode_component(raw: &str) -> Result<String, ApiError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| ApiError::bad_request("Invalid percent-encoding"))
}

/// Parse `a=1&b=2` into a map; later duplicates win
pub fn parse_query(query: Option<&str>) -> Result<HashMap<String, String>, ApiError> {
    let mut params = HashMap::new();
    let Some(query) = query else {
        return Ok(params);
    };

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(decode_component(key)?, decode_component(value)?);
    }
    Ok(params)
}

/// Topic filter from `grade` and `category`; empty values are ignored
pub fn topic_filter(params: &HashMap<String, String>) -> Result<TopicFilter, ApiError> {
    let mut filter = TopicFilter::all();

    if let Some(grade) = params.get("grade").filter(|g| !g.is_empty()) {
        let grade: u8 = grade
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid grade: {grade}")))?;
        filter = filter.grade(grade);
    }
    if let Some(category) = params.get("category").filter(|c| !c.is_empty()) {
        filter = filter.category(category.clone());
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_decodes() {
        let params = parse_query(Some("grade=1&category=Basic%202D+Shapes&flag")).unwrap();
        assert_eq!(params["grade"], "1");
        assert_eq!(params["category"], "Basic 2D Shapes");
        assert_eq!(params["flag"], "");
        assert!(parse_query(None).unwrap().is_empty());
    }

    #[test]
    fn test_topic_filter() {
        let params = parse_query(Some("grade=1&category=Numbers")).unwrap();
        let filter = topic_filter(&params).unwrap();
        assert_eq!(filter, TopicFilter::all().grade(1).category("Numbers"));

        let params = parse_query(Some("grade=&category=")).unwrap();
        assert_eq!(topic_filter(&params).unwrap(), TopicFilter::all());
    }

    #[test]
    fn test_bad_grade() {
        let params = parse_query(Some("grade=first")).unwrap();
        assert_eq!(topic_filter(&params).unwrap_err().status.as_u16(), 400);
    }

    #[test]
    fn test_bad_encoding() {
        assert!(parse_query(Some("category=%FF")).is_err());
    }
}
