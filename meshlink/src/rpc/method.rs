//! Method contracts: argument, success and declared exception types.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// A typed RPC method belonging to some service.
///
/// Implementations are zero-sized markers; the associated types carry the
/// contract. Methods without a return value use `()` as [`Method::Success`],
/// methods without declared exceptions use [`NoException`].
pub trait Method: Send + Sync + 'static {
    /// Method name as seen on the wire.
    const NAME: &'static str;
    /// Argument struct.
    type Args: Serialize + DeserializeOwned + Send + Sync + 'static;
    /// Success value.
    type Success: Serialize + DeserializeOwned + Send + 'static;
    /// Closed set of declared exceptions.
    type Exception: Exception;
}

/// The closed set of exceptions a method declares.
///
/// Usually an enum with one variant per declared exception, generated with
/// [`exception_set!`](crate::exception_set).
pub trait Exception: std::error::Error + Clone + Send + Sync + Sized + 'static {
    /// Wire names of the declared exceptions, in declaration order.
    const DECLARED: &'static [&'static str];

    /// Wire name of this exception.
    fn name(&self) -> &'static str;

    /// Encodes the exception body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be represented as JSON.
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Decodes the exception named `name`.
    ///
    /// Returns `Ok(None)` when `name` is not one of [`Exception::DECLARED`].
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match the declared type.
    fn from_payload(name: &str, payload: serde_json::Value)
        -> Result<Option<Self>, serde_json::Error>;
}

/// Exception set of a method that declares none. Uninhabited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoException {}

impl fmt::Display for NoException {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for NoException {}

impl Exception for NoException {
    const DECLARED: &'static [&'static str] = &[];

    fn name(&self) -> &'static str {
        match *self {}
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match *self {}
    }

    fn from_payload(
        _name: &str,
        _payload: serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error> {
        Ok(None)
    }
}

/// Declares an exception-set enum and implements [`Exception`] for it.
///
/// Every variant wraps one serializable error type and is bound to its wire
/// name:
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
/// #[error("key not found: {key}")]
/// pub struct KeyNotFound {
///     pub key: String,
/// }
///
/// meshlink::exception_set! {
///     /// Exceptions declared by `Get`.
///     pub enum GetException {
///         NotFound(KeyNotFound) = "notFound",
///     }
/// }
///
/// use meshlink::rpc::Exception;
/// assert_eq!(GetException::DECLARED, &["notFound"]);
/// ```
#[macro_export]
macro_rules! exception_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($ty:ty) = $wire:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                #[allow(missing_docs)]
                $variant($ty),
            )+
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant(inner) => ::std::fmt::Display::fmt(inner, f),)+
                }
            }
        }

        impl ::std::error::Error for $name {}

        $(
            impl ::std::convert::From<$ty> for $name {
                fn from(inner: $ty) -> Self {
                    Self::$variant(inner)
                }
            }
        )+

        impl $crate::rpc::Exception for $name {
            const DECLARED: &'static [&'static str] = &[$($wire),+];

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $wire,)+
                }
            }

            fn to_payload(
                &self,
            ) -> ::std::result::Result<$crate::__private::serde_json::Value, $crate::__private::serde_json::Error> {
                match self {
                    $(Self::$variant(inner) => $crate::__private::serde_json::to_value(inner),)+
                }
            }

            fn from_payload(
                name: &str,
                payload: $crate::__private::serde_json::Value,
            ) -> ::std::result::Result<::std::option::Option<Self>, $crate::__private::serde_json::Error> {
                $(
                    if name == $wire {
                        return $crate::__private::serde_json::from_value::<$ty>(payload)
                            .map(|inner| ::std::option::Option::Some(Self::$variant(inner)));
                    }
                )+
                ::std::result::Result::Ok(::std::option::Option::None)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
    #[error("busy for {seconds}s")]
    struct Busy {
        seconds: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
    #[error("forbidden")]
    struct Forbidden {}

    crate::exception_set! {
        enum Declared {
            Busy(Busy) = "busy",
            Forbidden(Forbidden) = "forbidden",
        }
    }

    #[test]
    fn declared_names_should_follow_declaration_order() {
        assert_eq!(Declared::DECLARED, &["busy", "forbidden"]);
        assert_eq!(Declared::from(Busy { seconds: 1 }).name(), "busy");
        assert_eq!(Declared::Forbidden(Forbidden {}).name(), "forbidden");
    }

    #[test]
    fn from_payload_should_ignore_undeclared_names() {
        let decoded = Declared::from_payload("teapot", serde_json::json!({})).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn from_payload_should_reject_mismatched_bodies() {
        let decoded = Declared::from_payload("busy", serde_json::json!({"seconds": "soon"}));
        assert!(decoded.is_err());
    }

    #[test]
    fn display_should_delegate_to_the_wrapped_exception() {
        let err = Declared::Busy(Busy { seconds: 3 });
        assert_eq!(err.to_string(), "busy for 3s");
    }

    #[test]
    fn no_exception_should_decode_nothing() {
        assert!(NoException::DECLARED.is_empty());
        let decoded = NoException::from_payload("anything", serde_json::Value::Null).unwrap();
        assert!(decoded.is_none());
    }
}
