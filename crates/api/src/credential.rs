use std::fmt;

/// Cookie the server uses to carry its access token.
pub const SESSION_COOKIE: &str = "access_token_cookie";

/// Session cookies issued at login, attached explicitly to later requests.
///
/// Only `name=value` pairs are kept; cookie attributes such as `Path` or
/// `HttpOnly` are dropped since the client never scopes them.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    cookies: Vec<(String, String)>,
}

impl SessionCredential {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            cookies: vec![(name.into(), value.into())],
        }
    }

    /// Collect cookies from already parsed `name`/`value` pairs.
    ///
    /// Cookies with an empty value are deletions and are skipped; a later
    /// cookie replaces an earlier one with the same name. Returns `None` when
    /// no usable cookie remains.
    pub fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Option<Self>
    where
        N: Into<String>,
        V: Into<String>,
    {
        let mut cookies: Vec<(String, String)> = Vec::new();
        for (name, value) in pairs {
            let (name, value) = (name.into(), value.into());
            if name.is_empty() || value.is_empty() {
                continue;
            }
            match cookies.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value,
                None => cookies.push((name, value)),
            }
        }
        (!cookies.is_empty()).then_some(Self { cookies })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value for a `Cookie` request header.
    #[must_use]
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.cookies.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("SessionCredential")
            .field("cookies", &names)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_every_issued_cookie() {
        let credential = SessionCredential::from_pairs([
            (SESSION_COOKIE, "abc.def"),
            ("csrf_access_token", "xyz"),
        ])
        .unwrap();
        assert_eq!(credential.get(SESSION_COOKIE), Some("abc.def"));
        assert_eq!(
            credential.header_value(),
            "access_token_cookie=abc.def; csrf_access_token=xyz"
        );
    }

    #[test]
    fn later_cookie_with_same_name_wins() {
        let credential = SessionCredential::from_pairs([("a", "1"), ("a", "2")]).unwrap();
        assert_eq!(credential.header_value(), "a=2");
    }

    #[test]
    fn deletions_yield_nothing() {
        assert!(SessionCredential::from_pairs([("a", "")]).is_none());
        assert!(SessionCredential::from_pairs(Vec::<(String, String)>::new()).is_none());
    }

    #[test]
    fn debug_hides_values() {
        let credential = SessionCredential::new(SESSION_COOKIE, "secret-token");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains(SESSION_COOKIE));
        assert!(!rendered.contains("secret-token"));
    }
}
