//! Assertion macros for integration tests.

/// Await a client receive and panic with the call site on failure.
#[macro_export]
macro_rules! recv_expect {
    ($fut:expr) => {{
        $fut.await
            .expect(concat!("recv failed at ", file!(), ":", line!()))
    }};
    ($fut:expr, $msg:expr) => {{
        let m = ::std::format!("{msg} at {}:{}", file!(), line!(), msg = $msg);
        $fut.await.expect(&m)
    }};
}

/// Assert that `$message` is an `ERROR` reply carrying `$text`.
#[macro_export]
macro_rules! assert_error_reply {
    ($message:expr, $text:expr) => {{
        let message: &::scorewire::message::Message = &$message;
        assert_eq!(
            message.id(),
            ::scorewire::message::catalog::ERROR,
            "expected ERROR reply, got {message:?}"
        );
        assert_eq!(message.text(0), Some($text));
    }};
}

pub use crate::{assert_error_reply, recv_expect};
