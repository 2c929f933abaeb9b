/// Defines a newtype ID wrapper around an integer-like scalar (typically `i64`)
/// and generates:
/// - derives (Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)
/// - `Display`
/// - `From<$inner> for $name` and `From<$name> for $inner`
/// - `is_set()`, true for strictly positive ids
///
/// Usage:
///   define_id_type!(i64, RaceId);
#[macro_export]
macro_rules! define_id_type {
    ($inner:ty, $name:ident) => {
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::write!(f, "{}", self.0)
            }
        }

        impl ::std::convert::From<$inner> for $name {
            fn from(v: $inner) -> Self {
                $name(v)
            }
        }

        impl ::std::convert::From<$name> for $inner {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl $name {
            pub fn new(value: $inner) -> Self {
                $name(value)
            }

            pub fn value(&self) -> $inner {
                self.0
            }

            /// Zero and negative ids are treated as "no id" by filters.
            pub fn is_set(&self) -> bool {
                self.0 > 0
            }
        }
    };
}

#[cfg(test)]
mod tests {
    define_id_type!(i64, SampleId);

    #[test]
    fn test_id_conversions() {
        let id = SampleId::from(7);
        assert_eq!(id.value(), 7);
        assert_eq!(i64::from(id), 7);
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn test_id_is_set() {
        assert!(SampleId::new(1).is_set());
        assert!(!SampleId::new(0).is_set());
        assert!(!SampleId::new(-3).is_set());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&SampleId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: SampleId = serde_json::from_str("42").unwrap();
        assert_eq!(back, SampleId::new(42));
    }
}
