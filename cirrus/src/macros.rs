/// Creates a single chat [`Message`](crate::Message) from a role shorthand.
///
/// ```rust
/// use cirrus::{Role, cirrus_msg};
///
/// let message = cirrus_msg!(assistant => "Done.");
/// assert_eq!(message.role, Role::Assistant);
/// assert_eq!(message.text(), "Done.");
/// ```
#[macro_export]
macro_rules! cirrus_msg {
    (system => $content:expr $(,)?) => {
        $crate::Message::system($content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Message::user($content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::assistant($content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, or assistant");
    };
}

/// Creates a `Vec<Message>` from role/content pairs, e.g. to seed agent history.
///
/// ```rust
/// use cirrus::{Role, cirrus_messages};
///
/// let messages = cirrus_messages![
///     user => "Hi, I'm planning a trip.",
///     assistant => "Where to?",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role, Role::User);
/// assert_eq!(messages[1].role, Role::Assistant);
/// ```
#[macro_export]
macro_rules! cirrus_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::cirrus_msg!($role => $content)),+]
    };
}

/// Creates a [`ToolDescriptor`](crate::ToolDescriptor) from a plain function.
///
/// ```rust
/// use cirrus::{ToolArguments, ToolError, ToolOutput, cirrus_tool};
///
/// fn now(_args: &ToolArguments) -> Result<ToolOutput, ToolError> {
///     Ok("12:00".into())
/// }
///
/// let tool = cirrus_tool!(now, "Current time", r#"{"type":"object","properties":{}}"#);
/// assert_eq!(tool.name(), "now");
/// ```
#[macro_export]
macro_rules! cirrus_tool {
    ($function:ident, $description:expr, $schema:expr $(,)?) => {
        $crate::ToolDescriptor::new(
            stringify!($function),
            $description,
            $schema,
            $crate::Invocable::function($function),
        )
    };
    ($name:expr, $description:expr, $schema:expr, $invocable:expr $(,)?) => {
        $crate::ToolDescriptor::new($name, $description, $schema, $invocable)
    };
}
