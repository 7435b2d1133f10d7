use std::collections::HashMap;

use crate::error::Error;

/// Logical facet name to facet value mapping
///
/// Facet ordering is never taken from this map; it always comes from the
/// owning [`KeyTemplate`].
pub type FacetValues = HashMap<String, String>;

/// Separator between the template prefix and each facet segment
const DELIMITER: char = '#';

/// Label/value separator inside one facet segment
const LABEL_SEPARATOR: char = '_';

/// Declaration of one physical key part: a fixed prefix plus an ordered
/// sequence of facet names
///
/// The order facets are added in is the order they are joined in; it is fixed
/// at definition time and never reordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    pub(crate) prefix: String,
    pub(crate) facets: Vec<String>,
}

impl KeyTemplate {
    /// Create a template with the given fixed prefix, e.g. `"$ecommerce"`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            facets: Vec::new(),
        }
    }

    /// Append a facet name to the join order
    pub fn facet(mut self, name: impl Into<String>) -> Self {
        self.facets.push(name.into());
        self
    }
}

/// Pure encoder/decoder between ordered facet values and one physical key
/// string
///
/// Composition is a bijection on the declared facet-value tuple: encoding is
/// deterministic, and [`parse`](KeyComposer::parse) recovers the exact facet
/// values that went in. Delimiter characters inside facet values are escaped
/// so no two distinct tuples can collide to the same physical string. The
/// encoding is the sole correlation mechanism between a request key and a
/// chunked or retried response, so any ambiguity here would break
/// response-to-request matching.
#[derive(Debug, Clone)]
pub struct KeyComposer {
    index: String,
    template: KeyTemplate,
}

impl KeyComposer {
    /// Build a composer for one key part of the named index
    pub fn new(index: impl Into<String>, template: KeyTemplate) -> Self {
        Self {
            index: index.into(),
            template,
        }
    }

    /// Compose the physical key string for the given facet values
    ///
    /// Every facet declared by the template must be present and non-empty,
    /// otherwise this fails with [`Error::MissingFacet`]. Pure: no side
    /// effects, same input always yields the same key.
    pub fn compose(&self, facet_values: &FacetValues) -> Result<String, Error> {
        let mut key = self.template.prefix.clone();

        for facet in &self.template.facets {
            let value = facet_values
                .get(facet)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::MissingFacet {
                    index: self.index.clone(),
                    facet: facet.clone(),
                })?;

            key.push(DELIMITER);
            key.push_str(facet);
            key.push(LABEL_SEPARATOR);
            key.push_str(&escape(value));
        }

        Ok(key)
    }

    /// Recover the facet values from a physical key string
    ///
    /// Exact inverse of [`compose`](KeyComposer::compose). Fails with
    /// [`Error::MalformedKey`] when the string does not match the template
    /// shape: wrong prefix, wrong facet label, wrong segment count, or a
    /// dangling escape sequence.
    pub fn parse(&self, physical: &str) -> Result<FacetValues, Error> {
        let malformed = || Error::MalformedKey {
            index: self.index.clone(),
            key: physical.to_string(),
        };

        let rest = physical
            .strip_prefix(self.template.prefix.as_str())
            .ok_or_else(malformed)?;

        // The remainder is "" for a facet-less template, otherwise a
        // '#'-led sequence of "label_value" segments.
        let mut segments = rest.split(DELIMITER);
        if segments.next() != Some("") {
            return Err(malformed());
        }

        let mut values = FacetValues::with_capacity(self.template.facets.len());
        for facet in &self.template.facets {
            let segment = segments.next().ok_or_else(malformed)?;
            let escaped = segment
                .strip_prefix(facet.as_str())
                .and_then(|r| r.strip_prefix(LABEL_SEPARATOR))
                .ok_or_else(malformed)?;

            let value = unescape(escaped).ok_or_else(malformed)?;
            if value.is_empty() {
                return Err(malformed());
            }
            let _ = values.insert(facet.clone(), value);
        }

        if segments.next().is_some() {
            return Err(malformed());
        }

        Ok(values)
    }

    /// Names of the facets this composer consumes, in join order
    pub fn facet_names(&self) -> &[String] {
        &self.template.facets
    }
}

/// Escape the delimiter and the escape lead-in so facet values survive a
/// plain split on '#'
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            DELIMITER => out.push_str("%23"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            match (chars.next(), chars.next()) {
                (Some('2'), Some('3')) => out.push(DELIMITER),
                (Some('2'), Some('5')) => out.push('%'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> KeyComposer {
        KeyComposer::new(
            "primary",
            KeyTemplate::new("$app").facet("org").facet("region"),
        )
    }

    fn facets(pairs: &[(&str, &str)]) -> FacetValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_compose_is_deterministic() {
        let composer = composer();
        let values = facets(&[("org", "acme"), ("region", "eu-west-1")]);

        let first = composer.compose(&values).unwrap();
        let second = composer.compose(&values).unwrap();

        assert_eq!(first, "$app#org_acme#region_eu-west-1");
        assert_eq!(first, second);
    }

    #[test]
    fn test_compose_respects_declared_order_not_map_order() {
        let composer = KeyComposer::new(
            "primary",
            KeyTemplate::new("$app").facet("region").facet("org"),
        );
        let values = facets(&[("org", "acme"), ("region", "eu")]);

        let key = composer.compose(&values).unwrap();
        assert_eq!(key, "$app#region_eu#org_acme");
    }

    #[test]
    fn test_compose_missing_facet() {
        let composer = composer();
        let values = facets(&[("org", "acme")]);

        let err = composer.compose(&values).unwrap_err();
        assert!(matches!(err, Error::MissingFacet { ref facet, .. } if facet == "region"));
    }

    #[test]
    fn test_compose_empty_value_is_missing() {
        let composer = composer();
        let values = facets(&[("org", ""), ("region", "eu")]);

        let err = composer.compose(&values).unwrap_err();
        assert!(matches!(err, Error::MissingFacet { ref facet, .. } if facet == "org"));
    }

    #[test]
    fn test_parse_inverts_compose() {
        let composer = composer();
        let values = facets(&[("org", "acme"), ("region", "eu-west-1")]);

        let key = composer.compose(&values).unwrap();
        let recovered = composer.parse(&key).unwrap();

        assert_eq!(recovered, values);
    }

    #[test]
    fn test_delimiter_in_value_does_not_collide() {
        let composer = composer();
        // Without escaping these two tuples would produce the same key.
        let a = facets(&[("org", "ac#me"), ("region", "eu")]);
        let b = facets(&[("org", "ac"), ("region", "me#eu")]);

        let key_a = composer.compose(&a).unwrap();
        let key_b = composer.compose(&b).unwrap();

        assert_ne!(key_a, key_b);
        assert_eq!(composer.parse(&key_a).unwrap(), a);
        assert_eq!(composer.parse(&key_b).unwrap(), b);
    }

    #[test]
    fn test_escape_lead_in_round_trips() {
        let composer = composer();
        let values = facets(&[("org", "100%"), ("region", "a%23b")]);

        let key = composer.compose(&values).unwrap();
        assert_eq!(composer.parse(&key).unwrap(), values);
    }

    #[test]
    fn test_underscore_in_value_round_trips() {
        let composer = composer();
        let values = facets(&[("org", "acme_inc"), ("region", "eu_west_1")]);

        let key = composer.compose(&values).unwrap();
        assert_eq!(composer.parse(&key).unwrap(), values);
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        let composer = composer();
        let err = composer.parse("$other#org_acme#region_eu").unwrap_err();
        assert!(matches!(err, Error::MalformedKey { .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_label() {
        let composer = composer();
        let err = composer.parse("$app#tenant_acme#region_eu").unwrap_err();
        assert!(matches!(err, Error::MalformedKey { .. }));
    }

    #[test]
    fn test_parse_rejects_missing_segment() {
        let composer = composer();
        let err = composer.parse("$app#org_acme").unwrap_err();
        assert!(matches!(err, Error::MalformedKey { .. }));
    }

    #[test]
    fn test_parse_rejects_extra_segment() {
        let composer = composer();
        let err = composer
            .parse("$app#org_acme#region_eu#stray_x")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedKey { .. }));
    }

    #[test]
    fn test_parse_rejects_dangling_escape() {
        let composer = composer();
        let err = composer.parse("$app#org_acme%2#region_eu").unwrap_err();
        assert!(matches!(err, Error::MalformedKey { .. }));
    }

    #[test]
    fn test_facetless_template() {
        let composer = KeyComposer::new("primary", KeyTemplate::new("$app#orders"));
        let key = composer.compose(&FacetValues::new()).unwrap();

        assert_eq!(key, "$app#orders");
        assert!(composer.parse(&key).unwrap().is_empty());
        assert!(composer.parse("$app#orders#extra").is_err());
    }
}
