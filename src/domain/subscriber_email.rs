use validator::validate_email;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Accepts `local@domain` addresses whose domain part has at least one dot.
    pub fn parse(s: String) -> Result<SubscriberEmail, String> {
        let has_dotted_domain = s
            .rsplit_once('@')
            .map_or(false, |(_, domain)| domain.contains('.'));
        if validate_email(&s) && has_dotted_domain {
            Ok(Self(s))
        } else {
            Err(format!("{} is not a valid subscriber email.", s))
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
