//! Deterministic URL query construction shared by every provider.
//!
//! Pairs render in insertion order. List values repeat the key with a literal
//! `[]` suffix (`via[]=Bern&via[]=Olten`); everything else is percent-encoded,
//! so a space becomes `%20`, never `+`.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<Pair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pair {
    key: String,
    value: String,
    list: bool,
}

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one `key=value` pair.
    pub fn push(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push(Pair {
            key: key.to_string(),
            value: value.to_string(),
            list: false,
        });
        self
    }

    /// Append the pair only when a value is present.
    pub fn push_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Append one `key[]=item` pair per item. An empty list adds nothing.
    pub fn push_list<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for value in values {
            self.pairs.push(Pair {
                key: key.to_string(),
                value: value.as_ref().to_string(),
                list: true,
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Decoded pairs as they will appear on the wire, list keys including `[]`.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.pairs
            .iter()
            .map(|p| {
                let key = if p.list {
                    format!("{}[]", p.key)
                } else {
                    p.key.clone()
                };
                (key, p.value.clone())
            })
            .collect()
    }

    /// Percent-encoded `k=v&k=v` form.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, pair) in self.pairs.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(&urlencoding::encode(&pair.key));
            if pair.list {
                out.push_str("[]");
            }
            out.push('=');
            out.push_str(&urlencoding::encode(&pair.value));
        }
        out
    }

    /// Attach the query to `base`, respecting any query the base already has.
    pub fn append_to(&self, base: &str) -> String {
        if self.is_empty() {
            return base.to_string();
        }
        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{base}{sep}{}", self.render())
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_repeat_the_key() {
        let q = QueryString::new().push_list("person_titles", ["software engineer", "cto"]);
        assert_eq!(
            q.render(),
            "person_titles[]=software%20engineer&person_titles[]=cto"
        );
    }

    #[test]
    fn empty_lists_and_missing_options_are_omitted() {
        let q = QueryString::new()
            .push_list("via", Vec::<String>::new())
            .push_opt("date", None::<&str>)
            .push("from", "Bern");
        assert_eq!(q.render(), "from=Bern");
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn reserved_characters_are_encoded() {
        let q = QueryString::new()
            .push("typeName", "ich-tanke-strom:evse")
            .push("outputFormat", "application/json")
            .push("from", "Zürich HB");
        assert_eq!(
            q.render(),
            "typeName=ich-tanke-strom%3Aevse&outputFormat=application%2Fjson&from=Z%C3%BCrich%20HB"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let q = QueryString::new()
            .push("limit", 10)
            .push_list("regions", ["EUU", "CHE"])
            .push("include_links", false);
        assert_eq!(q.render(), q.render());
        assert_eq!(q.to_string(), q.render());
    }

    #[test]
    fn append_respects_existing_query() {
        let q = QueryString::new().push("a", 1);
        assert_eq!(q.append_to("http://x/y"), "http://x/y?a=1");
        assert_eq!(q.append_to("http://x/y?z=2"), "http://x/y?z=2&a=1");
        assert_eq!(QueryString::new().append_to("http://x"), "http://x");
    }

    #[test]
    fn pairs_expose_decoded_keys() {
        let q = QueryString::new().push("from", "Zürich").push_list("via", ["Olten"]);
        assert_eq!(
            q.pairs(),
            vec![
                ("from".to_string(), "Zürich".to_string()),
                ("via[]".to_string(), "Olten".to_string()),
            ]
        );
    }
}
