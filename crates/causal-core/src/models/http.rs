use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method of a detected network call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Convenient method to get Option
    pub fn from_str_opt(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Whether `name` is exactly an uppercase HTTP verb, the shape of a route handler export
    pub fn is_handler_name(name: &str) -> bool {
        matches!(name, "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "OPTIONS" | "HEAD")
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Use eq_ignore_ascii_case to avoid allocation
        if s.eq_ignore_ascii_case("GET") {
            Ok(HttpMethod::Get)
        } else if s.eq_ignore_ascii_case("POST") {
            Ok(HttpMethod::Post)
        } else if s.eq_ignore_ascii_case("PUT") {
            Ok(HttpMethod::Put)
        } else if s.eq_ignore_ascii_case("PATCH") {
            Ok(HttpMethod::Patch)
        } else if s.eq_ignore_ascii_case("DELETE") {
            Ok(HttpMethod::Delete)
        } else if s.eq_ignore_ascii_case("OPTIONS") {
            Ok(HttpMethod::Options)
        } else if s.eq_ignore_ascii_case("HEAD") {
            Ok(HttpMethod::Head)
        } else {
            Err(())
        }
    }
}
