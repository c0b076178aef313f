//! Ergonomic macro for building context maps literally.

/// Builds a [`ContextMap`](crate::types::ContextMap) from `key => value`
/// pairs. Values accept anything `serde_json::json!` accepts.
///
/// # Examples
///
/// ```
/// use faultline::context;
///
/// let ctx = context! {
///     "user_id" => 42,
///     "endpoint" => "/api/orders",
///     "attempt" => [1, 2, 3],
/// };
///
/// assert_eq!(ctx.len(), 3);
/// assert_eq!(ctx.get("user_id"), Some(&serde_json::json!(42)));
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::types::ContextMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::types::ContextMap::new();
        $( map.insert($key, $crate::__private::json!($value)); )+
        map
    }};
}
