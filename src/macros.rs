//! Macros for ergonomic payload construction.

/// Build a [`Payload`](crate::core::Payload) from `field => value` pairs.
///
/// Values go through `FieldValue::from`, so strings, integers, booleans,
/// timestamps, uuids and `Option`s can be used directly.
///
/// # Example
///
/// ```
/// use eventsource::payload;
/// use eventsource::core::FieldValue;
///
/// let payload = payload! {
///     "assignee" => "Alice",
///     "priority" => 3_i64,
///     "reviewer" => None::<&str>,
/// };
///
/// assert_eq!(payload["assignee"], FieldValue::Text("Alice".into()));
/// assert_eq!(payload["reviewer"], FieldValue::Null);
/// ```
#[macro_export]
macro_rules! payload {
    () => {
        $crate::core::Payload::new()
    };
    (
        $( $field:expr => $value:expr ),+ $(,)?
    ) => {{
        let mut payload = $crate::core::Payload::new();
        $(
            payload.insert(
                ::std::string::String::from($field),
                $crate::core::FieldValue::from($value),
            );
        )+
        payload
    }};
}
