//! Macros to reduce boilerplate in the codebase

/// Give a closed enum a fixed set of string names.
///
/// Generates `as_str`, `Display` (the name) and `FromStr`, which trims its
/// input and ignores ASCII case. Unknown names become `$error_variant`
/// carrying the raw input.
///
/// # Usage
///
/// ```rust,ignore
/// use crate::error::InboxError;
///
/// string_enum!(
///     TicketStatus,
///     InboxError::InvalidStatus,
///     {
///         Open => "open",
///         Pending => "pending",
///     }
/// );
/// ```
#[macro_export]
macro_rules! string_enum {
    (
        $enum_name:ident,
        $error_variant:path,
        { $($variant:ident => $name:literal),+ $(,)? }
    ) => {
        impl $enum_name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($enum_name::$variant => $name,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = $crate::error::InboxError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let wanted = s.trim();
                [$(($name, $enum_name::$variant)),+]
                    .into_iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
                    .map(|(_, value)| value)
                    .ok_or_else(|| $error_variant(s.to_string()))
            }
        }
    };
}
