/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// Scalars go through `Value::from`, so anything with a `From` impl works,
/// including `chrono` dates and times.
///
/// ```rust
/// use config_formats::{value, Value};
///
/// let v = value!({
///     "name": "Alice",
///     "tags": ["admin", "user"],
///     "manager": null
/// });
/// assert_eq!(v.get("name"), Some(&Value::from("Alice")));
/// ```
#[macro_export]
macro_rules! value {
    // Handle null
    (null) => {
        $crate::Value::Null
    };

    // Handle true
    (true) => {
        $crate::Value::Bool(true)
    };

    // Handle false
    (false) => {
        $crate::Value::Bool(false)
    };

    // Handle empty sequence
    ([]) => {
        $crate::Value::Sequence(vec![])
    };

    // Handle non-empty sequence
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Sequence(vec![$($crate::value!($elem)),*])
    };

    // Handle empty mapping
    ({}) => {
        $crate::Value::Mapping($crate::Mapping::new())
    };

    // Handle non-empty mapping
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut mapping = $crate::Mapping::new();
        $(
            mapping.insert($key, $crate::value!($value));
        )*
        $crate::Value::Mapping(mapping)
    }};

    // Any other expression with a `From` impl
    ($s:expr) => {
        $crate::Value::from($s)
    };
}
