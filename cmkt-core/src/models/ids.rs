macro_rules! index_wrapper {
    ($struct:ident, $prefix:literal) => {
        #[doc = concat!("A dense index newtype identifying a ", stringify!($struct), " within its market")]
        #[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        #[repr(transparent)]
        pub struct $struct(usize);

        impl $struct {
            /// The position of this entity in its market
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $struct {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }

        impl From<$struct> for usize {
            fn from(value: $struct) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

index_wrapper!(GoodId, "g");
index_wrapper!(BidderId, "b");
