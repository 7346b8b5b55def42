//! Optional per-call parameters
//!
//! Every request carries a [`RequestOptions`] bag of query parameters and
//! headers. It is filled in by the caller before the request enters the
//! decorated client and only read afterwards.

/// Query parameters and extra headers applied to one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a query parameter.
    #[must_use]
    pub fn with_query_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.query.retain(|(n, _)| *n != name);
        self.query.push((name, value.into()));
        self
    }

    /// Add a request header. Header names are case-insensitive.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn query_parameters(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a query parameter by name.
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.headers.is_empty()
    }

    // ========== Well-known parameters ==========

    /// Only act if the object's current generation matches.
    #[must_use]
    pub fn if_generation_match(self, generation: i64) -> Self {
        self.with_query_parameter("ifGenerationMatch", generation.to_string())
    }

    #[must_use]
    pub fn if_generation_not_match(self, generation: i64) -> Self {
        self.with_query_parameter("ifGenerationNotMatch", generation.to_string())
    }

    #[must_use]
    pub fn if_metageneration_match(self, metageneration: i64) -> Self {
        self.with_query_parameter("ifMetagenerationMatch", metageneration.to_string())
    }

    #[must_use]
    pub fn if_metageneration_not_match(self, metageneration: i64) -> Self {
        self.with_query_parameter("ifMetagenerationNotMatch", metageneration.to_string())
    }

    /// Select a specific object generation.
    #[must_use]
    pub fn generation(self, generation: i64) -> Self {
        self.with_query_parameter("generation", generation.to_string())
    }

    /// Bill the request to this project (requester pays buckets).
    #[must_use]
    pub fn user_project(self, project: impl Into<String>) -> Self {
        self.with_query_parameter("userProject", project)
    }

    #[must_use]
    pub fn prefix(self, prefix: impl Into<String>) -> Self {
        self.with_query_parameter("prefix", prefix)
    }

    #[must_use]
    pub fn delimiter(self, delimiter: impl Into<String>) -> Self {
        self.with_query_parameter("delimiter", delimiter)
    }

    #[must_use]
    pub fn max_results(self, max: u32) -> Self {
        self.with_query_parameter("maxResults", max.to_string())
    }

    /// `noAcl` or `full`.
    #[must_use]
    pub fn projection(self, projection: impl Into<String>) -> Self {
        self.with_query_parameter("projection", projection)
    }

    #[must_use]
    pub fn predefined_acl(self, acl: impl Into<String>) -> Self {
        self.with_query_parameter("predefinedAcl", acl)
    }

    #[must_use]
    pub fn predefined_default_object_acl(self, acl: impl Into<String>) -> Self {
        self.with_query_parameter("predefinedDefaultObjectAcl", acl)
    }

    #[must_use]
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parameters_replace_previous_value() {
        let options = RequestOptions::new()
            .prefix("logs/")
            .max_results(10)
            .prefix("data/");

        assert_eq!(options.query_parameter("prefix"), Some("data/"));
        assert_eq!(options.query_parameter("maxResults"), Some("10"));
        assert_eq!(options.query_parameters().len(), 2);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let options = RequestOptions::new()
            .with_header("content-type", "text/plain")
            .content_type("application/json");

        assert_eq!(
            options.headers(),
            &[("Content-Type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn test_preconditions() {
        let options = RequestOptions::new()
            .if_generation_match(7)
            .if_metageneration_not_match(3)
            .user_project("billing-project");

        assert_eq!(options.query_parameter("ifGenerationMatch"), Some("7"));
        assert_eq!(options.query_parameter("ifMetagenerationNotMatch"), Some("3"));
        assert_eq!(options.query_parameter("userProject"), Some("billing-project"));
        assert!(!options.is_empty());
        assert!(RequestOptions::new().is_empty());
    }
}
