use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transform {
    Upper,
    Lower,
    Title,
    Windows,
    Mac,
}

impl Transform {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "up" => Some(Self::Upper),
            "lw" => Some(Self::Lower),
            "ti" => Some(Self::Title),
            "win" => Some(Self::Windows),
            "mac" => Some(Self::Mac),
            _ => None,
        }
    }

    pub fn apply(self, value: &str) -> String {
        match self {
            Self::Upper => value.to_uppercase(),
            Self::Lower => value.to_lowercase(),
            Self::Title => title_case(value),
            Self::Windows => value.chars().filter(|ch| !is_windows_disallowed(*ch)).collect(),
            Self::Mac => value.chars().filter(|ch| *ch != ':').collect(),
        }
    }
}

/// Applies an optional transform, passing the value through untouched when
/// the token carried none.
pub fn apply_optional(transform: Option<Transform>, value: String) -> String {
    match transform {
        Some(t) => t.apply(&value),
        None => value,
    }
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;

    for ch in value.chars() {
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            at_word_start = true;
            out.push(ch);
        }
    }

    out
}

fn is_windows_disallowed(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || ch.is_control()
}
