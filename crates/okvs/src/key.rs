//! Key serialization
//!
//! Every encoder hashes keys as bytes. Key types opt in by implementing
//! [`OkvsKey`]; two keys that serialize to the same bytes are the same key.

use std::borrow::Cow;

/// A key that can be hashed into OKVS positions
pub trait OkvsKey {
    fn key_bytes(&self) -> Cow<'_, [u8]>;
}

impl OkvsKey for [u8] {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl OkvsKey for Vec<u8> {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl<const N: usize> OkvsKey for [u8; N] {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl OkvsKey for str {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl OkvsKey for String {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

macro_rules! impl_okvs_key_for_int {
    ($($t:ty),*) => {
        $(
            impl OkvsKey for $t {
                fn key_bytes(&self) -> Cow<'_, [u8]> {
                    Cow::Owned(self.to_le_bytes().to_vec())
                }
            }
        )*
    };
}

impl_okvs_key_for_int!(u32, u64, u128);

impl<T: OkvsKey + ?Sized> OkvsKey for &T {
    fn key_bytes(&self) -> Cow<'_, [u8]> {
        (**self).key_bytes()
    }
}
