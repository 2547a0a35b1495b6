//! Query-string encoding for read requests.
//!
//! Parameters are emitted in a fixed order (`fields`, `filter`, `limit`,
//! `offset`, `sort`) with `application/x-www-form-urlencoded` escaping, so
//! the same options always produce the same bytes.

use std::fmt;

use url::form_urlencoded;

/// Field selection the API understands as "most fields".
pub const DEFAULT_FIELDS: &str = "most";

/// Filter, sort, pagination, and field selection for a GET.
///
/// Empty strings are treated the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub filter: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset.to_string());
        self
    }

    /// Encode only the parameters that are set.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.pairs() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Encode for a GET: like `encode`, with `fields` defaulting to `most`.
    pub fn encode_for_read(&self) -> String {
        let mut options = self.clone();
        if non_empty(&options.fields).is_none() {
            options.fields = Some(DEFAULT_FIELDS.to_string());
        }
        options.encode()
    }

    fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("fields", non_empty(&self.fields)),
            ("filter", non_empty(&self.filter)),
            ("limit", non_empty(&self.limit)),
            ("offset", non_empty(&self.offset)),
            ("sort", non_empty(&self.sort)),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Conjunction of equality clauses in the API's filter grammar.
///
/// Values are quoted verbatim; the grammar has no documented escape for `'`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field eq 'value'`
    pub fn eq(mut self, field: &str, value: &str) -> Self {
        self.clauses.push(format!("{field} eq '{value}'"));
        self
    }

    /// `field eq 'value'` when `value` is present.
    pub fn eq_opt(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    /// `field eq null`
    pub fn is_null(mut self, field: &str) -> Self {
        self.clauses.push(format!("{field} eq null"));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The joined expression, or `None` when no clause was added.
    pub fn build(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.to_string())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clauses.join(" and "))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_options_encode_to_nothing() {
        assert_eq!(QueryOptions::new().encode(), "");
    }

    #[test]
    fn empty_options_read_defaults_fields_to_most() {
        assert_eq!(QueryOptions::new().encode_for_read(), "fields=most");
    }

    #[test]
    fn single_parameter_encodes_to_single_pair() {
        assert_eq!(QueryOptions::new().limit(10).encode(), "limit=10");
        assert_eq!(QueryOptions::new().offset(5).encode(), "offset=5");
        assert_eq!(QueryOptions::new().sort("-name").encode(), "sort=-name");
        assert_eq!(
            QueryOptions::new().fields("$key,name").encode(),
            "fields=%24key%2Cname"
        );
        assert_eq!(
            QueryOptions::new().filter("name eq 'web'").encode(),
            "filter=name+eq+%27web%27"
        );
    }

    #[test]
    fn empty_strings_are_omitted() {
        let options = QueryOptions {
            filter: Some(String::new()),
            sort: Some(String::new()),
            ..QueryOptions::default()
        };
        assert_eq!(options.encode_for_read(), "fields=most");
    }

    #[test]
    fn order_is_fixed_regardless_of_construction_order() {
        let a = QueryOptions::new().sort("name").limit(2).filter("a eq 'b'");
        let b = QueryOptions::new().filter("a eq 'b'").limit(2).sort("name");
        assert_eq!(a.encode(), b.encode());
        assert_eq!(
            a.encode_for_read(),
            "fields=most&filter=a+eq+%27b%27&limit=2&sort=name"
        );
    }

    #[test]
    fn explicit_fields_override_default() {
        let options = QueryOptions::new().fields("machine,name,$key,is_snapshot");
        assert_eq!(
            options.encode_for_read(),
            "fields=machine%2Cname%2C%24key%2Cis_snapshot"
        );
    }

    #[test]
    fn filter_survives_escaping_round_trip() {
        let filter = "name eq 'my vm & co' and owner eq null";
        let encoded = QueryOptions::new().filter(filter).encode();
        let decoded: Vec<(String, String)> = form_urlencoded::parse(encoded.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(decoded, vec![("filter".to_string(), filter.to_string())]);
    }

    #[test]
    fn filter_builder_joins_with_and() {
        let filter = Filter::new().is_null("owner").eq("name", "iso");
        assert_eq!(filter.build().as_deref(), Some("owner eq null and name eq 'iso'"));
        assert_eq!(Filter::new().eq_opt("name", None).build(), None);
    }
}
