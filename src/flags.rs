//! Per-call flag sets.
//!
//! Each call accepts only the bits defined for it. Flag values are built
//! from the named constants, or from raw bits with `from_bits`, which
//! refuses bits the call does not know.
use std::ops;

use crate::error;

macro_rules! call_flags {
    (
        $(#[$meta:meta])*
        $name:ident for $function:literal {
            $(
                $(#[$flag_meta:meta])*
                const $flag:ident = $value:expr;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            $(
                $(#[$flag_meta])*
                pub const $flag: Self = Self($value);
            )*

            /// libvirt function the flags belong to.
            pub const FUNCTION: &'static str = $function;

            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn all() -> Self {
                Self(0 $(| $value)*)
            }

            pub const fn bits(&self) -> u32 {
                self.0
            }

            pub const fn is_empty(&self) -> bool {
                self.0 == 0
            }

            pub const fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn intersects(&self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            pub fn from_bits(bits: u32) -> Option<Self> {
                if bits & !Self::all().0 == 0 {
                    Some(Self(bits))
                } else {
                    None
                }
            }

            /// Validate raw bits received from a caller.
            pub fn check(bits: u32) -> Result<Self, error::Error> {
                Self::from_bits(bits).ok_or(error::Error::UnsupportedFlags {
                    function: Self::FUNCTION,
                    bits: bits & !Self::all().0,
                })
            }
        }

        impl ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

call_flags! {
    /// Flags of `virSecretGetXMLDesc`. None are defined.
    SecretXmlFlags for "virSecretGetXMLDesc" {}
}

call_flags! {
    /// Flags of `virSecretGetValue` and `virSecretSetValue`. None are defined.
    SecretValueFlags for "virSecretGetValue" {}
}

call_flags! {
    SecretDefineFlags for "virSecretDefineXML" {
        /// Reject elements the daemon does not know instead of ignoring them.
        const VALIDATE = 1 << 0;
    }
}

call_flags! {
    ListAllSecretsFlags for "virConnectListAllSecrets" {
        const EPHEMERAL = 1 << 0;
        const NO_EPHEMERAL = 1 << 1;
        const PRIVATE = 1 << 2;
        const NO_PRIVATE = 1 << 3;
    }
}

impl ListAllSecretsFlags {
    /// Whether a secret with the given attributes passes the filter.
    ///
    /// Each pair (`EPHEMERAL`/`NO_EPHEMERAL`, `PRIVATE`/`NO_PRIVATE`) only
    /// filters when exactly one of its two bits is set.
    pub fn matches(&self, ephemeral: bool, private: bool) -> bool {
        let pair_matches = |yes: Self, no: Self, value: bool| {
            match (self.contains(yes), self.contains(no)) {
                (true, false) => value,
                (false, true) => !value,
                _ => true,
            }
        };

        pair_matches(Self::EPHEMERAL, Self::NO_EPHEMERAL, ephemeral)
            && pair_matches(Self::PRIVATE, Self::NO_PRIVATE, private)
    }
}
