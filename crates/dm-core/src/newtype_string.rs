//! Macro for identifier newtypes.
//!
//! Every identifier that crosses the directory/list boundary (entity ids,
//! natural keys, row ids) is a trimmed, non-blank string. The macro generates
//! the wrapper plus the conversions the pipelines need to use it as a map key.

/// Define a trimmed, non-blank string identifier.
///
/// Construction only goes through `try_new` / `TryFrom`, which trim
/// surrounding whitespace and reject blank input, so a value of the type is
/// always usable as a lookup key.
macro_rules! define_key_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                $Name::try_new(&raw).ok_or_else(|| {
                    serde::de::Error::custom(concat!(stringify!($Name), " must not be blank"))
                })
            }
        }

        impl $Name {
            /// Build from raw text, returning `None` when it is blank after trimming.
            pub fn try_new(raw: impl AsRef<str>) -> Option<Self> {
                let trimmed = raw.as_ref().trim();
                (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $Name {
            type Error = &'static str;
            fn try_from(raw: &str) -> Result<Self, Self::Error> {
                $Name::try_new(raw).ok_or(concat!(stringify!($Name), " must not be blank"))
            }
        }

        impl TryFrom<String> for $Name {
            type Error = &'static str;
            fn try_from(raw: String) -> Result<Self, Self::Error> {
                $Name::try_from(raw.as_str())
            }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

pub(crate) use define_key_string;
